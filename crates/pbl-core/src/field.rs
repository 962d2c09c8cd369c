//! Typed, editable attributes attached to a card.
//!
//! A `Field` is plain data. Every value is kept as a string, including
//! slider positions and toggles, so editors and the generation pipeline
//! can treat all fields uniformly. Updates never mutate in place: they
//! produce a new `Field` with the same `id` and kind.

use serde::{Deserialize, Serialize};

/// Default slider range when a template does not declare one.
pub const DEFAULT_SLIDER_RANGE: (i32, i32) = (0, 100);

fn default_slider_range() -> (i32, i32) {
    DEFAULT_SLIDER_RANGE
}

/// Widget-level type of a field. Carries the per-type extras
/// (select options, slider range, radar weight).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Slider {
        #[serde(default = "default_slider_range")]
        range: (i32, i32),
    },
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    Toggle,
    Tags,
    /// Weighted rubric dimension. `value` holds the dimension name.
    RadarDim { weight: u8 },
    /// One shot of a storyboard. `value` holds the shot description.
    StoryShot,
}

/// Scaffolding intensity band read off a 0–100 slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityBand {
    Low,
    Medium,
    High,
}

impl IntensityBand {
    pub fn from_value(value: i64) -> Self {
        if value < 33 {
            IntensityBand::Low
        } else if value < 66 {
            IntensityBand::Medium
        } else {
            IntensityBand::High
        }
    }
}

/// A single editable attribute of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique within the owning node.
    pub id: String,
    pub label: String,
    pub value: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Field {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
            kind,
            placeholder: None,
        }
    }

    pub fn text(id: &str, label: &str, value: &str) -> Self {
        Self::new(id, label, value, FieldKind::Text)
    }

    pub fn textarea(id: &str, label: &str, value: &str) -> Self {
        Self::new(id, label, value, FieldKind::Textarea)
    }

    pub fn select(id: &str, label: &str, value: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        Self::new(id, label, value, FieldKind::Select { options })
    }

    pub fn slider(id: &str, label: &str, value: i32) -> Self {
        Self::new(
            id,
            label,
            value.to_string(),
            FieldKind::Slider {
                range: DEFAULT_SLIDER_RANGE,
            },
        )
    }

    pub fn radar_dim(id: &str, label: &str, value: &str, weight: u8) -> Self {
        Self::new(id, label, value, FieldKind::RadarDim { weight: weight.min(100) })
    }

    pub fn story_shot(id: &str, label: &str, value: &str) -> Self {
        Self::new(id, label, value, FieldKind::StoryShot)
    }

    /// Produce a copy carrying `value`, constrained the way the widget
    /// would constrain it.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = match &self.kind {
            FieldKind::Slider { range: (min, max) } => {
                let n = value.trim().parse::<i64>().unwrap_or(i64::from(*min));
                n.clamp(i64::from(*min), i64::from(*max)).to_string()
            }
            FieldKind::Toggle => {
                let on = matches!(value.trim(), "true" | "1" | "on" | "yes");
                on.to_string()
            }
            _ => value,
        };
        Self {
            value,
            ..self.clone()
        }
    }

    /// Produce a copy of a rubric dimension with a new weight (0–100).
    /// Other field kinds come back unchanged.
    #[must_use]
    pub fn with_weight(&self, weight: i64) -> Self {
        match self.kind {
            FieldKind::RadarDim { .. } => Self {
                kind: FieldKind::RadarDim {
                    weight: weight.clamp(0, 100) as u8,
                },
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Whether generated text may be written back into this field.
    pub fn is_long_text(&self) -> bool {
        matches!(self.kind, FieldKind::Textarea | FieldKind::StoryShot)
    }

    pub fn weight(&self) -> Option<u8> {
        match self.kind {
            FieldKind::RadarDim { weight } => Some(weight),
            _ => None,
        }
    }

    /// Numeric reading of a slider. `None` for other kinds.
    pub fn slider_value(&self) -> Option<i64> {
        match self.kind {
            FieldKind::Slider { range: (min, _) } => {
                Some(self.value.trim().parse().unwrap_or(i64::from(min)))
            }
            _ => None,
        }
    }

    pub fn intensity_band(&self) -> Option<IntensityBand> {
        self.slider_value().map(IntensityBand::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_value_keeps_identity() {
        let f = Field::textarea("f2", "Scenario", "old");
        let g = f.with_value("new");
        assert_eq!(g.id, "f2");
        assert_eq!(g.kind, FieldKind::Textarea);
        assert_eq!(g.value, "new");
        assert_eq!(f.value, "old");
    }

    #[test]
    fn slider_clamps_to_range() {
        let f = Field::slider("f1", "Scaffold intensity", 50);
        assert_eq!(f.with_value("140").value, "100");
        assert_eq!(f.with_value("-3").value, "0");
        assert_eq!(f.with_value("abc").value, "0");
        assert_eq!(f.with_value(" 42 ").value, "42");
    }

    #[test]
    fn toggle_normalises() {
        let f = Field::new("t", "Visible", "false", FieldKind::Toggle);
        assert_eq!(f.with_value("on").value, "true");
        assert_eq!(f.with_value("nope").value, "false");
    }

    #[test]
    fn weight_clamps_and_ignores_other_kinds() {
        let d = Field::radar_dim("d1", "Dimension", "Teamwork", 40);
        assert_eq!(d.with_weight(130).weight(), Some(100));
        assert_eq!(d.with_weight(-5).weight(), Some(0));

        let t = Field::text("f1", "Role", "Architect");
        assert_eq!(t.with_weight(10), t);
    }

    #[test]
    fn intensity_bands() {
        let f = Field::slider("f1", "Scaffold intensity", 10);
        assert_eq!(f.intensity_band(), Some(IntensityBand::Low));
        assert_eq!(f.with_value("33").intensity_band(), Some(IntensityBand::Medium));
        assert_eq!(f.with_value("66").intensity_band(), Some(IntensityBand::High));
        assert_eq!(Field::text("x", "y", "z").intensity_band(), None);
    }

    #[test]
    fn wire_format_is_flat() {
        let f = Field::radar_dim("d1", "Dimension", "Creativity", 30);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["type"], "radar-dim");
        assert_eq!(json["weight"], 30);

        let s: Field = serde_json::from_str(
            r#"{"id":"f1","label":"Intensity","value":"50","type":"slider"}"#,
        )
        .unwrap();
        assert_eq!(s.kind, FieldKind::Slider { range: (0, 100) });
    }
}
