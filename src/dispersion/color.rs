use serde::{Serialize, Serializer};

/// PM2.5 concentration band (μg/m³), AQI-style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqiBand {
    Good,
    Moderate,
    SensitiveUnhealthy,
    Unhealthy,
    Hazardous,
}

impl AqiBand {
    /// Marker fill colour used by the map client.
    pub fn hex(self) -> &'static str {
        match self {
            AqiBand::Good => "#2ecc71",
            AqiBand::Moderate => "#f1c40f",
            AqiBand::SensitiveUnhealthy => "#e67e22",
            AqiBand::Unhealthy => "#e74c3c",
            AqiBand::Hazardous => "#8e44ad",
        }
    }
}

impl Serialize for AqiBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

/// Lower bounds are inclusive; the top band is unbounded.
pub fn color_for(pm25: f64) -> AqiBand {
    if pm25 < 12.0 {
        AqiBand::Good
    } else if pm25 < 35.5 {
        AqiBand::Moderate
    } else if pm25 < 55.5 {
        AqiBand::SensitiveUnhealthy
    } else if pm25 < 150.5 {
        AqiBand::Unhealthy
    } else {
        AqiBand::Hazardous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(color_for(0.0), AqiBand::Good);
        assert_eq!(color_for(11.9), AqiBand::Good);
        assert_eq!(color_for(12.0), AqiBand::Moderate);
        assert_eq!(color_for(35.4), AqiBand::Moderate);
        assert_eq!(color_for(35.5), AqiBand::SensitiveUnhealthy);
        assert_eq!(color_for(55.4), AqiBand::SensitiveUnhealthy);
        assert_eq!(color_for(55.5), AqiBand::Unhealthy);
        assert_eq!(color_for(150.4), AqiBand::Unhealthy);
        assert_eq!(color_for(150.5), AqiBand::Hazardous);
        assert_eq!(color_for(10_000.0), AqiBand::Hazardous);
    }

    #[test]
    fn serializes_as_hex() {
        let json = serde_json::to_string(&AqiBand::Moderate).unwrap();
        assert_eq!(json, "\"#f1c40f\"");
    }
}
