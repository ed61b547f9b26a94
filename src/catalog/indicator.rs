//! Universal indicator - test strip colors and the reference pH scale
//!
//! Pure lookups used by the rendering layer to tint used strips and to light
//! up the scale marks near each reading.

use serde::{Deserialize, Serialize};

/// Neutral point of the scale.
pub const NEUTRAL_PH: f64 = 7.0;

/// Readings within this distance of a scale mark light it up.
pub const MARK_RADIUS: f64 = 1.0;

/// Acid/base classification of a pH value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhClass {
    /// pH below 7
    Acidic,
    /// pH exactly 7
    Neutral,
    /// pH above 7
    Basic,
}

impl PhClass {
    /// Classify a pH value.
    #[must_use]
    pub fn of(ph: f64) -> Self {
        if (ph - NEUTRAL_PH).abs() < f64::EPSILON {
            Self::Neutral
        } else if ph < NEUTRAL_PH {
            Self::Acidic
        } else {
            Self::Basic
        }
    }
}

/// Color a test strip turns at the given pH.
#[must_use]
pub fn strip_color(ph: f64) -> &'static str {
    match PhClass::of(ph) {
        PhClass::Neutral => "#00FF00",
        PhClass::Acidic if ph <= 2.0 => "#FF0000",
        PhClass::Acidic if ph <= 4.0 => "#FF6600",
        PhClass::Acidic if ph <= 6.0 => "#FFAA00",
        PhClass::Acidic => "#FFFF00",
        PhClass::Basic if ph <= 8.0 => "#66FF66",
        PhClass::Basic if ph <= 10.0 => "#00FFFF",
        PhClass::Basic if ph <= 12.0 => "#0066FF",
        PhClass::Basic => "#0000FF",
    }
}

/// One mark on the printed pH scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleMark {
    /// pH value of the mark
    pub value: f64,
    /// Swatch color
    pub color: &'static str,
    /// Caption
    pub label: &'static str,
}

/// The nine marks of the reference scale, acidic to basic.
pub const SCALE: [ScaleMark; 9] = [
    ScaleMark { value: 0.0, color: "#FF0000", label: "Very acidic" },
    ScaleMark { value: 2.0, color: "#FF6600", label: "Strong acid" },
    ScaleMark { value: 4.0, color: "#FFAA00", label: "Acidic" },
    ScaleMark { value: 6.0, color: "#FFFF00", label: "Slightly acidic" },
    ScaleMark { value: 7.0, color: "#00FF00", label: "Neutral" },
    ScaleMark { value: 8.0, color: "#66FF66", label: "Slightly basic" },
    ScaleMark { value: 10.0, color: "#00FFFF", label: "Basic" },
    ScaleMark { value: 12.0, color: "#0066FF", label: "Strong base" },
    ScaleMark { value: 14.0, color: "#0000FF", label: "Very basic" },
];

/// Scale marks that have at least one reading within [`MARK_RADIUS`].
pub fn highlighted_marks<I>(readings: I) -> Vec<&'static ScaleMark>
where
    I: IntoIterator<Item = f64>,
{
    let readings: Vec<f64> = readings.into_iter().collect();
    SCALE
        .iter()
        .filter(|mark| readings.iter().any(|r| (r - mark.value).abs() < MARK_RADIUS))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(PhClass::of(2.0), PhClass::Acidic);
        assert_eq!(PhClass::of(7.0), PhClass::Neutral);
        assert_eq!(PhClass::of(7.05), PhClass::Basic);
        assert_eq!(PhClass::of(6.99), PhClass::Acidic);
    }

    #[test]
    fn test_strip_color_thresholds() {
        assert_eq!(strip_color(1.0), "#FF0000");
        assert_eq!(strip_color(2.0), "#FF0000");
        assert_eq!(strip_color(2.5), "#FF6600");
        assert_eq!(strip_color(5.0), "#FFAA00");
        assert_eq!(strip_color(6.5), "#FFFF00");
        assert_eq!(strip_color(7.0), "#00FF00");
        assert_eq!(strip_color(7.9), "#66FF66");
        assert_eq!(strip_color(9.0), "#00FFFF");
        assert_eq!(strip_color(12.0), "#0066FF");
        assert_eq!(strip_color(13.5), "#0000FF");
    }

    #[test]
    fn test_highlighted_marks() {
        let lit = highlighted_marks([2.1, 6.9]);
        let values: Vec<f64> = lit.iter().map(|m| m.value).collect();
        // 6.9 is within 1 of both 6 and 7
        assert_eq!(values, vec![2.0, 6.0, 7.0]);
    }

    #[test]
    fn test_no_readings_no_marks() {
        assert!(highlighted_marks(std::iter::empty()).is_empty());
    }
}
