//! Drive paths for the simulator.

use anyhow::{anyhow, bail, Context, Result};
use hazard_core::{bearing_degrees, destination_point, distance_km, GeoPoint};
use rand::Rng;

/// Constant-speed drive along a polyline.
#[derive(Debug, Clone)]
pub struct PolylinePath {
    points: Vec<GeoPoint>,
    /// Distance from the start to each vertex, km
    cumulative_km: Vec<f64>,
    speed_mps: f64,
}

impl PolylinePath {
    pub fn new(points: Vec<GeoPoint>, speed_mps: f64) -> Result<Self> {
        if points.len() < 2 {
            bail!("a drive path needs at least two waypoints");
        }
        if !(speed_mps.is_finite() && speed_mps > 0.0) {
            bail!("speed must be positive, got {speed_mps}");
        }

        let mut cumulative_km = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative_km.push(0.0);
        for pair in points.windows(2) {
            total += distance_km(pair[0], pair[1]);
            cumulative_km.push(total);
        }

        Ok(Self {
            points,
            cumulative_km,
            speed_mps,
        })
    }

    pub fn length_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or(0.0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.length_km() * 1000.0 / self.speed_mps
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Position `t` seconds after departure; clamps to the last waypoint.
    pub fn position_at(&self, t: f64) -> GeoPoint {
        let (segment, into_segment_km) = self.locate(t);
        let from = self.points[segment];
        let to = self.points[segment + 1];
        if into_segment_km <= 0.0 {
            return from;
        }
        destination_point(from, into_segment_km * 1000.0, bearing_degrees(from, to))
    }

    /// Heading of the segment being driven at `t`.
    pub fn heading_at(&self, t: f64) -> f64 {
        let (segment, _) = self.locate(t);
        bearing_degrees(self.points[segment], self.points[segment + 1])
    }

    fn locate(&self, t: f64) -> (usize, f64) {
        let travelled_km = (t.max(0.0) * self.speed_mps / 1000.0).min(self.length_km());
        let last_segment = self.points.len() - 2;
        let segment = self
            .cumulative_km
            .windows(2)
            .position(|w| travelled_km < w[1])
            .unwrap_or(last_segment);
        (segment, travelled_km - self.cumulative_km[segment])
    }
}

/// Displace `point` by up to `noise_m` metres in a random direction.
pub fn add_gps_noise<R: Rng>(point: GeoPoint, noise_m: f64, rng: &mut R) -> GeoPoint {
    if noise_m <= 0.0 {
        return point;
    }
    let offset = rng.random_range(0.0..noise_m);
    let bearing = rng.random_range(0.0..360.0);
    destination_point(point, offset, bearing)
}

/// Parse `"lat,lng;lat,lng;..."`.
pub fn parse_waypoints(raw: &str) -> Result<Vec<GeoPoint>> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| -> Result<GeoPoint> {
            let (lat, lng) = pair
                .split_once(',')
                .ok_or_else(|| anyhow!("waypoint '{pair}' is not 'lat,lng'"))?;
            let point = GeoPoint::new(
                lat.trim().parse().with_context(|| format!("bad latitude in '{pair}'"))?,
                lng.trim().parse().with_context(|| format!("bad longitude in '{pair}'"))?,
            );
            if !point.is_valid() {
                bail!("waypoint '{pair}' is out of range");
            }
            Ok(point)
        })
        .collect()
}
