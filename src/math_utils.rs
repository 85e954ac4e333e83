/// Interpolation helpers shared by the animation and intensity code

/// Linear interpolation between two values
///
/// # Arguments
/// * `a` - Start value
/// * `b` - End value
/// * `ratio` - Interpolation ratio (0.0 = a, 1.0 = b)
///
/// # Examples
/// ```
/// use solar_hex_rust::math_utils::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
/// assert_eq!(lerp(0.002, 0.08, 0.0), 0.002);
/// ```
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Clamp a value between minimum and maximum bounds
///
/// NaN is mapped to `min` so downstream buffers never see it.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Clamp to the unit interval
pub fn saturate(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Perceptual intensity of `value` relative to `max`
///
/// Square-root scaling lifts small totals so they remain visible next to
/// the day's peak. Zero when either side is non-positive.
///
/// ```
/// use solar_hex_rust::math_utils::normalized_intensity;
///
/// assert_eq!(normalized_intensity(25.0, 100.0), 0.5);
/// assert_eq!(normalized_intensity(-3.0, 100.0), 0.0);
/// ```
pub fn normalized_intensity(value: f64, max: f64) -> f64 {
    if max > 0.0 && value > 0.0 {
        (value / max).sqrt()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(100.0, 200.0, 0.25), 125.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(f64::NAN, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(1.5), 1.0);
        assert_eq!(saturate(-0.1), 0.0);
        assert_eq!(saturate(0.3), 0.3);
    }

    #[test]
    fn test_normalized_intensity() {
        assert_eq!(normalized_intensity(100.0, 100.0), 1.0);
        assert_eq!(normalized_intensity(0.0, 100.0), 0.0);
        assert_eq!(normalized_intensity(10.0, 0.0), 0.0);
        assert!((normalized_intensity(1.0, 4.0) - 0.5).abs() < 1e-12);
    }
}
