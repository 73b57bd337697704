use std::fmt;

use serde::Serialize;

/// Eight-point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    const ROSE: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NE => "NE",
            Compass::E => "E",
            Compass::SE => "SE",
            Compass::S => "S",
            Compass::SW => "SW",
            Compass::W => "W",
            Compass::NW => "NW",
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nearest compass label for a bearing. Sector boundaries round up, so
/// 22.5° is NE and 360° wraps back to N.
pub fn compass(bearing_deg: f64) -> Compass {
    let normalized = bearing_deg.rem_euclid(360.0);
    let ix = (normalized / 45.0 + 0.5) as usize % 8;
    Compass::ROSE[ix]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_points() {
        assert_eq!(compass(0.0), Compass::N);
        assert_eq!(compass(90.0), Compass::E);
        assert_eq!(compass(180.0), Compass::S);
        assert_eq!(compass(270.0), Compass::W);
        assert_eq!(compass(360.0), Compass::N);
    }

    #[test]
    fn sector_boundaries_round_up() {
        assert_eq!(compass(22.4), Compass::N);
        assert_eq!(compass(22.5), Compass::NE);
        assert_eq!(compass(44.0), Compass::NE);
        assert_eq!(compass(337.5), Compass::N);
        assert_eq!(compass(337.4), Compass::NW);
    }

    #[test]
    fn negative_and_large_bearings_wrap() {
        assert_eq!(compass(-90.0), Compass::W);
        assert_eq!(compass(720.0 + 135.0), Compass::SE);
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&Compass::SW).unwrap(), "\"SW\"");
        assert_eq!(Compass::NE.to_string(), "NE");
    }
}
