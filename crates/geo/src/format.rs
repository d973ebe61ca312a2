//! Distance labels for report cards and map popups.

/// Format a distance in kilometers for display.
///
/// - under 1 km: whole meters (`"850 m"`)
/// - under 100 km: one decimal (`"12.3 km"`)
/// - otherwise whole kilometers (`"586 km"`)
/// - unknown (infinite or NaN): `"unknown"`
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() || km < 0.0 {
        return "unknown".to_string();
    }

    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else if km < 100.0 {
        format!("{km:.1} km")
    } else {
        format!("{km:.0} km")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(0.85), "850 m");
        assert_eq!(format_distance(12.34), "12.3 km");
        assert_eq!(format_distance(582.46), "582 km");
        assert_eq!(format_distance(f64::INFINITY), "unknown");
        assert_eq!(format_distance(f64::NAN), "unknown");
    }
}
