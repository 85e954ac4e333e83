use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named (frequency, damping ratio) pairs
///
/// The plain speed presets are critically damped; the others trade settling
/// time for bounce or stiffness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpringPreset {
    UltraSlow,
    VerySlow,
    Slow,
    Normal,
    Fast,
    VeryFast,
    UltraFast,
    Bouncy,
    VeryBouncy,
    Stiff,
    Rigid,
    Loose,
    Responsive,
    Sluggish,
}

impl SpringPreset {
    pub const ALL: [SpringPreset; 14] = [
        SpringPreset::UltraSlow,
        SpringPreset::VerySlow,
        SpringPreset::Slow,
        SpringPreset::Normal,
        SpringPreset::Fast,
        SpringPreset::VeryFast,
        SpringPreset::UltraFast,
        SpringPreset::Bouncy,
        SpringPreset::VeryBouncy,
        SpringPreset::Stiff,
        SpringPreset::Rigid,
        SpringPreset::Loose,
        SpringPreset::Responsive,
        SpringPreset::Sluggish,
    ];

    /// (frequency, damping ratio)
    pub fn params(self) -> (f64, f64) {
        match self {
            SpringPreset::UltraSlow => (0.025, 1.0),
            SpringPreset::VerySlow => (0.05, 1.0),
            SpringPreset::Slow => (0.1, 1.0),
            SpringPreset::Normal => (0.2, 1.0),
            SpringPreset::Fast => (0.4, 1.0),
            SpringPreset::VeryFast => (0.8, 1.0),
            SpringPreset::UltraFast => (1.6, 1.0),
            SpringPreset::Bouncy => (0.2, 0.5),
            SpringPreset::VeryBouncy => (0.3, 0.3),
            SpringPreset::Stiff => (1.0, 1.2),
            SpringPreset::Rigid => (2.0, 1.5),
            SpringPreset::Loose => (0.15, 0.8),
            SpringPreset::Responsive => (1.2, 0.9),
            SpringPreset::Sluggish => (0.1, 1.5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpringPreset::UltraSlow => "ultra_slow",
            SpringPreset::VerySlow => "very_slow",
            SpringPreset::Slow => "slow",
            SpringPreset::Normal => "normal",
            SpringPreset::Fast => "fast",
            SpringPreset::VeryFast => "very_fast",
            SpringPreset::UltraFast => "ultra_fast",
            SpringPreset::Bouncy => "bouncy",
            SpringPreset::VeryBouncy => "very_bouncy",
            SpringPreset::Stiff => "stiff",
            SpringPreset::Rigid => "rigid",
            SpringPreset::Loose => "loose",
            SpringPreset::Responsive => "responsive",
            SpringPreset::Sluggish => "sluggish",
        }
    }

    /// True when the preset cannot overshoot from rest
    pub fn is_monotonic(self) -> bool {
        self.params().1 >= 1.0
    }
}

impl fmt::Display for SpringPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpringPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        SpringPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| format!("Unknown spring preset: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for preset in SpringPreset::ALL {
            assert_eq!(preset.name().parse::<SpringPreset>(), Ok(preset));
        }
        assert_eq!("Very-Bouncy".parse::<SpringPreset>(), Ok(SpringPreset::VeryBouncy));
        assert!("wobbly".parse::<SpringPreset>().is_err());
    }

    #[test]
    fn test_serde_names_match() {
        let json = serde_json::to_string(&SpringPreset::UltraFast).unwrap();
        assert_eq!(json, "\"ultra_fast\"");
        let parsed: SpringPreset = serde_json::from_str("\"very_slow\"").unwrap();
        assert_eq!(parsed, SpringPreset::VerySlow);
    }

    #[test]
    fn test_monotonic_presets() {
        assert!(SpringPreset::Fast.is_monotonic());
        assert!(SpringPreset::Sluggish.is_monotonic());
        assert!(!SpringPreset::Bouncy.is_monotonic());
        assert!(!SpringPreset::Responsive.is_monotonic());
    }
}
