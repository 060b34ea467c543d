use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Tinggi,
    Sedang,
    Rendah,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Tinggi => "tinggi",
            Severity::Sedang => "sedang",
            Severity::Rendah => "rendah",
        }
    }
}

/// Confidence buckets for the top-1 probability. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityPolicy {
    pub version: u32,
    pub high: f32,
    pub medium: f32,
}

pub const SEVERITY_POLICY: SeverityPolicy = SeverityPolicy {
    version: 1,
    high: 0.90,
    medium: 0.70,
};

impl SeverityPolicy {
    pub fn classify(&self, probability: f32) -> Severity {
        if probability >= self.high {
            Severity::Tinggi
        } else if probability >= self.medium {
            Severity::Sedang
        } else {
            Severity::Rendah
        }
    }
}

pub fn severity_of(probability: f32) -> Severity {
    SEVERITY_POLICY.classify(probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_at_lower_end() {
        assert_eq!(severity_of(0.90), Severity::Tinggi);
        assert_eq!(severity_of(0.8999), Severity::Sedang);
        assert_eq!(severity_of(0.70), Severity::Sedang);
        assert_eq!(severity_of(0.6999), Severity::Rendah);
    }

    #[test]
    fn extremes() {
        assert_eq!(severity_of(1.0), Severity::Tinggi);
        assert_eq!(severity_of(0.0), Severity::Rendah);
        assert_eq!(severity_of(f32::NAN), Severity::Rendah);
    }

    #[test]
    fn serializes_as_tier_name() {
        assert_eq!(serde_json::to_string(&Severity::Sedang).unwrap(), "\"sedang\"");
        assert_eq!(Severity::Tinggi.as_str(), "tinggi");
    }
}
