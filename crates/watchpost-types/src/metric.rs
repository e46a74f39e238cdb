use serde::{Deserialize, Serialize};

/// Warn/crit levels attached to a [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warn: f64,
    pub crit: f64,
}

impl Thresholds {
    pub fn new(warn: f64, crit: f64) -> Self {
        Self { warn, crit }
    }
}

/// Min/max boundaries attached to a [`Metric`], independent of its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundaries {
    pub min: f64,
    pub max: f64,
}

impl Boundaries {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// A single performance datum attached to a [`crate::CheckResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Thresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<Boundaries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            levels: None,
            boundaries: None,
            unit: None,
        }
    }

    pub fn with_levels(mut self, warn: f64, crit: f64) -> Self {
        self.levels = Some(Thresholds::new(warn, crit));
        self
    }

    pub fn with_boundaries(mut self, min: f64, max: f64) -> Self {
        self.boundaries = Some(Boundaries::new(min, max));
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Checkmk perfdata fragment: `name=value[;warn;crit[;min;max]]`.
    pub fn to_perfdata(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(unit) = &self.unit {
            out.push_str(unit);
        }
        if let Some(levels) = self.levels {
            out.push_str(&format!(";{};{}", levels.warn, levels.crit));
            if let Some(bounds) = self.boundaries {
                out.push_str(&format!(";{};{}", bounds.min, bounds.max));
            }
        } else if self.boundaries.is_some() {
            // Checkmk's format requires warn/crit placeholders before min/max.
            let bounds = self.boundaries.unwrap();
            out.push_str(&format!(";;;{};{}", bounds.min, bounds.max));
        }
        out
    }
}
