use crate::dispersion::SimulationInput;

use super::error::ApiError;

fn non_negative(name: &str, value: f64) -> Result<(), ApiError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{name} must be a finite, non-negative number"
        )))
    }
}

/// Request-boundary checks the generator itself does not make.
pub fn validate(input: &SimulationInput, max_points: usize) -> Result<(), ApiError> {
    non_negative("wind_speed", input.wind_speed)?;
    if !(0.0..=360.0).contains(&input.wind_dir_deg) {
        return Err(ApiError::Validation(
            "wind_dir_deg must be between 0 and 360".into(),
        ));
    }
    for (name, value) in [
        ("base_pm25", input.base_pm25),
        ("base_pm10", input.base_pm10),
        ("base_no2", input.base_no2),
        ("base_so2", input.base_so2),
        ("base_co", input.base_co),
    ] {
        non_negative(name, value)?;
    }
    if input.step_m == 0 {
        return Err(ApiError::Validation("step_m must be at least 1".into()));
    }
    if input.max_distance_m == 0 {
        return Err(ApiError::Validation(
            "max_distance_m must be at least 1".into(),
        ));
    }
    let points = input.point_count()?;
    if points > max_points {
        return Err(ApiError::Validation(format!(
            "request would generate {points} points, limit is {max_points}"
        )));
    }
    Ok(())
}
