use h3o::Resolution;

// Cell grid
pub const HEX_RESOLUTION: Resolution = Resolution::Five;
pub const HEX_RESOLUTION_LEVEL: u8 = 5;

// Bar heights (vertical scale of the unit-height prototype)
pub const MIN_SCALE_Y: f64 = 0.002;
pub const MAX_SCALE_Y: f64 = 0.08;

// Animation
pub const INITIAL_SCALE_Y: f64 = MIN_SCALE_Y;
pub const INITIAL_COLOR_T: f64 = 0.0;
pub const SPRING_SPEED: f64 = 100.0;
pub const SPRING_EPSILON: f64 = 0.0001;
pub const ANIMATION_TIME_DIVISOR: f64 = 10.0; // slows perceived motion
pub const COLOR_BOOST: f64 = 1.5; // mid-range intensities still read as warm
pub const TIME_KEY_INTERVAL_SECS: f64 = 0.06;

// Colors (sRGB, 0..1)
pub const COLD_COLOR_HEX: u32 = 0x444444;
pub const HOT_COLOR_HEX: u32 = 0x00ff66;
pub const DEFAULT_INSTANCE_COLOR_HEX: u32 = 0xffffff;

// Projection
pub const MAX_MERCATOR_LAT: f64 = 85.05112878;

// View fitting
pub const FIT_TARGET_SIZE: f64 = 250.0;

pub const HUD_SUBTITLE: &str = "Domestic solar power generation";

/// Converts a packed 0xRRGGBB color to normalized rgb components
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// sRGB transfer function inverse, per component
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        ((c * 0.9478672986 + 0.0521327014).powf(2.4)).min(1.0)
    }
}

/// Packed sRGB color in linear working space
pub fn linear_rgb_from_hex(hex: u32) -> [f32; 3] {
    rgb_from_hex(hex).map(srgb_to_linear)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(rgb_from_hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(rgb_from_hex(HOT_COLOR_HEX), [0.0, 1.0, 0.4]);
        assert_eq!(rgb_from_hex(0x000000), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_srgb_to_linear() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert_eq!(srgb_to_linear(1.0), 1.0);
        assert!((srgb_to_linear(0.4) - 0.1329).abs() < 1e-3);
        assert!((srgb_to_linear(0.02) - 0.02 / 12.92).abs() < 1e-7);
        assert_eq!(linear_rgb_from_hex(0xffffff), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_resolution_level_matches() {
        assert_eq!(u8::from(HEX_RESOLUTION), HEX_RESOLUTION_LEVEL);
    }
}
