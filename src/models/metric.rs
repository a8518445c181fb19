// Emitted metric record and its stdout line form

use std::fmt;

/// One emitted statistic: metric name, numeric value, source label.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: &'static str,
    pub value: f64,
    pub source: String,
}

impl MetricRecord {
    pub fn new(name: &'static str, value: f64, source: &str) -> Self {
        Self {
            name,
            value,
            source: source.to_string(),
        }
    }
}

/// Wire line: `NAME value source`. Whole values print without a fractional
/// part, everything else with two decimals.
impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.fract() == 0.0 {
            write!(f, "{} {} {}", self.name, self.value as i64, self.source)
        } else {
            write!(f, "{} {:.2} {}", self.name, self.value, self.source)
        }
    }
}
