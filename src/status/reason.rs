//! Human-readable explanations for a vehicle running off schedule.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::types::VehiclePosition;

/// Deviations smaller than this (in absolute seconds) get no reason.
pub const REASON_THRESHOLD_SEC: i64 = 120;

pub trait TrafficReasonProvider: Send + Sync {
    fn reason_for(&self, vehicle: &VehiclePosition, deviation_sec: i64) -> Option<String>;
}

static FLAVOR_MESSAGES: &[&str] = &[
    "Driver heard there was a sale at the mall.",
    "Bus stopped to argue with a pigeon.",
    "Driver practicing speedruns. Current PB: 3 minutes early.",
    "Time traveler drove this route.",
    "Driver forgot to reset clock after daylight savings.",
    "Vehicle achieved quantum entanglement with schedule.",
    "Gremlins in the GPS again.",
    "Driver took the scenic route (for science).",
    "Bus entered a wormhole near 3rd and Main.",
    "Schedule machine needs more coffee.",
];

/// The templated reason for a deviation, without any random substitution.
pub fn canonical_reason(route_id: &str, deviation_sec: i64) -> Option<String> {
    let magnitude = deviation_sec.abs();
    if magnitude < REASON_THRESHOLD_SEC {
        return None;
    }

    let reason = match deviation_sec {
        d if d >= 600 => format!(
            "Severe traffic likely impacting {route_id} (delay {} min).",
            (magnitude as f64 / 60.0).round() as i64
        ),
        d if d > 0 => format!("Moderate congestion detected along route {route_id}."),
        d if d <= -300 => format!("Light traffic allowing vehicles on route {route_id} to run ahead."),
        _ => format!("Lower-than-normal demand on route {route_id}."),
    };
    Some(reason)
}

pub fn is_flavor_message(reason: &str) -> bool {
    FLAVOR_MESSAGES.contains(&reason)
}

/// Template-based reasons, occasionally swapped for a flavor message.
pub struct HeuristicTrafficReasonProvider {
    rng: Mutex<StdRng>,
    flavor_probability: f64,
}

impl HeuristicTrafficReasonProvider {
    pub fn new(flavor_probability: f64) -> Self {
        Self::with_rng(StdRng::from_os_rng(), flavor_probability)
    }

    pub fn seeded(seed: u64, flavor_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), flavor_probability)
    }

    fn with_rng(rng: StdRng, flavor_probability: f64) -> Self {
        Self {
            rng: Mutex::new(rng),
            flavor_probability: flavor_probability.clamp(0.0, 1.0),
        }
    }
}

impl TrafficReasonProvider for HeuristicTrafficReasonProvider {
    fn reason_for(&self, vehicle: &VehiclePosition, deviation_sec: i64) -> Option<String> {
        let canonical = canonical_reason(&vehicle.route_id, deviation_sec)?;

        let mut rng = self.rng.lock();
        if rng.random_bool(self.flavor_probability) {
            if let Some(flavor) = FLAVOR_MESSAGES.choose(&mut *rng) {
                return Some(flavor.to_string());
            }
        }
        Some(canonical)
    }
}
