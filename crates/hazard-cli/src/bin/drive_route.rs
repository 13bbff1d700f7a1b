//! CLI tool to replay a drive as a GPS position stream into the hazard server.
//!
//! Drives the waypoint polyline at constant speed and adds random GPS noise.

use chrono::Utc;
use clap::Parser;
use hazard_cli::sim::{add_gps_noise, parse_waypoints, PolylinePath};
use hazard_cli::ServerClient;
use hazard_core::PositionSample;
use std::time::Duration;
use tokio::time;

/// Send a simulated drive to the hazard server
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Hazard server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Waypoints as "lat,lng;lat,lng;..."
    #[arg(long, default_value = "4.6097,-74.0817;4.6150,-74.0760;4.6280,-74.0650")]
    waypoints: String,

    /// Driving speed in km/h
    #[arg(long, default_value_t = 40.0)]
    speed: f64,

    /// Update rate in Hz
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Maximum GPS noise in metres
    #[arg(long, default_value_t = 5.0)]
    noise: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if !(args.rate.is_finite() && args.rate > 0.0) {
        anyhow::bail!("rate must be positive");
    }

    let waypoints = parse_waypoints(&args.waypoints)?;
    let path = PolylinePath::new(waypoints, args.speed / 3.6)?;
    let client = ServerClient::new(&args.url);
    let mut rng = rand::rng();

    println!("Driving {:.2} km at {} km/h", path.length_km(), args.speed);
    println!("  Server: {}", args.url);
    println!(
        "  Duration: {:.0}s, Update rate: {}Hz, Noise: {}m",
        path.duration_secs(),
        args.rate,
        args.noise
    );
    println!();

    let start = time::Instant::now();
    let mut update_count = 0u32;
    let mut interval = time::interval(Duration::from_secs_f64(1.0 / args.rate));

    loop {
        interval.tick().await;

        let elapsed = start.elapsed().as_secs_f64();
        let point = add_gps_noise(path.position_at(elapsed), args.noise, &mut rng);
        let sample = PositionSample {
            speed: Some(path.speed_mps()),
            heading: Some(path.heading_at(elapsed)),
            ..PositionSample::new(point, Utc::now())
        };

        match client.send_position(&sample).await {
            Ok(snapshot) => {
                update_count += 1;
                let step = &snapshot["session"]["current_step_index"];
                println!(
                    "[{:3}] ({:.6}, {:.6}) state={} step={}",
                    update_count, point.lat, point.lng, snapshot["session"]["state"], step
                );
            }
            Err(e) => {
                eprintln!("Error sending position: {}", e);
            }
        }

        if elapsed > path.duration_secs() {
            break;
        }
    }

    println!("\nDrive complete. Sent {} position updates.", update_count);
    Ok(())
}
