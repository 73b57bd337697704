use serde::{Deserialize, Serialize};

use crate::dispersion::field::round_to;

/// Planar wind components, rounded to three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindVector {
    pub vx: f64,
    pub vy: f64,
}

/// Components of the flow for a meteorological "from" direction. The
/// angle is turned by 180° so the vector points where the air is going.
pub fn wind_vector(speed: f64, direction_deg: f64) -> WindVector {
    let theta = (direction_deg + 180.0).to_radians();
    WindVector {
        vx: round_to(speed * theta.cos(), 3),
        vy: round_to(speed * theta.sin(), 3),
    }
}
