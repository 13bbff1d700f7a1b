//! CLI tool to report a hazard to the hazard server.

use clap::{Parser, ValueEnum};
use hazard_cli::client::NewAlert;
use hazard_cli::ServerClient;
use hazard_core::{AlertSeverity, AlertType, GeoPoint};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Severity {
    Critica,
    Alta,
    Media,
    Baja,
}

impl From<Severity> for AlertSeverity {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Critica => AlertSeverity::Critica,
            Severity::Alta => AlertSeverity::Alta,
            Severity::Media => AlertSeverity::Media,
            Severity::Baja => AlertSeverity::Baja,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Accident,
    Landslide,
    Flood,
    RoadClosure,
    Maintenance,
    Other,
}

impl From<Kind> for AlertType {
    fn from(value: Kind) -> Self {
        match value {
            Kind::Accident => AlertType::Accident,
            Kind::Landslide => AlertType::Landslide,
            Kind::Flood => AlertType::Flood,
            Kind::RoadClosure => AlertType::RoadClosure,
            Kind::Maintenance => AlertType::Maintenance,
            Kind::Other => AlertType::Other,
        }
    }
}

/// Report a hazard to the hazard server
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Hazard server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(long, value_enum, default_value_t = Severity::Alta)]
    severity: Severity,

    #[arg(long = "type", value_enum, default_value_t = Kind::Accident)]
    kind: Kind,

    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Update the alert with this id instead of creating one
    #[arg(long)]
    id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if !GeoPoint::new(args.lat, args.lng).is_valid() {
        anyhow::bail!("({}, {}) is not a valid coordinate", args.lat, args.lng);
    }

    let client = ServerClient::new(&args.url);
    let alert = client
        .report_alert(&NewAlert {
            id: args.id,
            severity: args.severity.into(),
            alert_type: args.kind.into(),
            lat: args.lat,
            lng: args.lng,
            title: args.title,
            description: args.description,
        })
        .await?;

    println!(
        "Reported {} alert {} at ({:.6}, {:.6})",
        alert.severity.as_str(),
        alert.id,
        alert.position.lat,
        alert.position.lng
    );
    Ok(())
}
