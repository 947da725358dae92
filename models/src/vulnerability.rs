use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Severity, VulnerabilityType};

/// A single finding reported by the scan backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type", default)]
    pub kind: VulnerabilityType,
    #[serde(default)]
    pub severity: Severity,
    /// Payload or signature that triggered detection. Display only.
    #[serde(default, deserialize_with = "lenient_text")]
    pub pattern: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub details: String,
    /// Always within `[0.0, 1.0]`; clamped on deserialization.
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: f64,
    /// Where it was found, e.g. `https://site/ - Form #1 action: /search (GET)`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: String,
}

impl Vulnerability {
    pub fn new(kind: impl Into<VulnerabilityType>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            severity,
            pattern: String::new(),
            details: String::new(),
            confidence: 0.0,
            location: String::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Confidence as a whole percentage, 0–100.
    pub fn confidence_percent(&self) -> u8 {
        (clamp_confidence(self.confidence) * 100.0).round() as u8
    }
}

/// Clamp a backend confidence score into `[0.0, 1.0]`. `NaN` becomes `0.0`.
pub fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
}

/// Accept numbers, numeric strings, or garbage; garbage reads as `0.0`.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(clamp_confidence(raw))
}

/// Strings pass through, numbers and booleans keep their text, the rest is empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped_on_ingestion() {
        let high: Vulnerability = serde_json::from_str(
            r#"{"type":"XSS","severity":"HIGH","confidence":1.5}"#,
        ).unwrap();
        assert_eq!(high.confidence, 1.0);
        assert_eq!(high.confidence_percent(), 100);

        let low: Vulnerability = serde_json::from_str(
            r#"{"type":"XSS","severity":"HIGH","confidence":-0.2}"#,
        ).unwrap();
        assert_eq!(low.confidence, 0.0);
        assert_eq!(low.confidence_percent(), 0);
    }

    #[test]
    fn test_malformed_confidence_does_not_fail() {
        let v: Vulnerability = serde_json::from_str(
            r#"{"type":"SSRF","severity":"LOW","confidence":"very"}"#,
        ).unwrap();
        assert_eq!(v.confidence, 0.0);

        let v: Vulnerability = serde_json::from_str(
            r#"{"type":"SSRF","severity":"LOW","confidence":null}"#,
        ).unwrap();
        assert_eq!(v.confidence, 0.0);

        let v: Vulnerability = serde_json::from_str(
            r#"{"type":"SSRF","severity":"LOW","confidence":"0.42"}"#,
        ).unwrap();
        assert_eq!(v.confidence_percent(), 42);
    }

    #[test]
    fn test_malformed_finding_is_kept() {
        let v: Vulnerability = serde_json::from_str(r#"{"severity":null}"#).unwrap();
        assert_eq!(v.severity, Severity::Unknown);
        assert_eq!(v.kind, VulnerabilityType::default());
        assert_eq!(v.kind.label(), "");

        let v: Vulnerability = serde_json::from_str(
            r#"{"type":"XSS","severity":2,"details":null,"location":null,"pattern":7}"#,
        ).unwrap();
        assert_eq!(v.kind, VulnerabilityType::Xss);
        assert_eq!(v.severity, Severity::Unknown);
        assert!(v.details.is_empty());
        assert!(v.location.is_empty());
        assert_eq!(v.pattern, "7");

        let v: Vulnerability = serde_json::from_str("{}").unwrap();
        assert_eq!(v.severity, Severity::Unknown);
        assert!(!v.kind.is_known());
    }

    #[test]
    fn test_full_backend_payload() {
        let raw = r#"{
            "type": "SQL_INJECTION",
            "severity": "CRITICAL",
            "pattern": "' OR 1=1--",
            "details": "Form input 'query' (type: search) may be injectable",
            "confidence": 0.99,
            "location": "https://example.com/ - Form #1 action: https://example.com/search (GET)"
        }"#;
        let v: Vulnerability = serde_json::from_str(raw).unwrap();
        assert_eq!(v.kind, VulnerabilityType::SqlInjection);
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.pattern, "' OR 1=1--");
        assert_eq!(v.confidence_percent(), 99);
    }

    #[test]
    fn test_builder_clamps() {
        let v = Vulnerability::new("XXE", Severity::Medium).with_confidence(f64::NAN);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(Vulnerability::new("XXE", Severity::Medium).with_confidence(7.0).confidence, 1.0);
    }
}
