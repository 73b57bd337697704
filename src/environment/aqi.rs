/// (conc_lo, conc_hi, index_lo, index_hi) for PM2.5 in μg/m³.
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 4] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
];

/// Index reported for any reading no breakpoint covers: past the last
/// band, negative, or inside the gaps between bands such as 12.05.
pub const AQI_CEILING: u32 = 300;

/// US-EPA style AQI from a PM2.5 reading.
pub fn pm25_to_aqi(pm: f64) -> u32 {
    PM25_BREAKPOINTS
        .iter()
        .find(|(lo, hi, _, _)| *lo <= pm && pm <= *hi)
        .map(|(lo, hi, ilo, ihi)| (((ihi - ilo) / (hi - lo)) * (pm - lo) + ilo).round() as u32)
        .unwrap_or(AQI_CEILING)
}
