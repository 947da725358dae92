use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Remediation shown for any type that has no dedicated entry.
pub const GENERIC_REMEDIATION: &[&str] =
    &["Consult a security expert to plan an appropriate response."];

/// Vulnerability class tag as reported by the scan backend.
///
/// The known variants have dedicated remediation guidance; anything else is
/// preserved verbatim in `Other` so it can still be displayed.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize)]
#[serde(into = "String")]
pub enum VulnerabilityType {
    SqlInjection,
    Xss,
    Csrf,
    CommandInjection,
    PathTraversal,
    Ssti,
    Xxe,
    Ssrf,
    OpenRedirect,
    CspMissing,
    MimeSniffing,
    Other(String),
}

impl VulnerabilityType {
    /// Every type with a dedicated remediation entry.
    pub const KNOWN: &[VulnerabilityType] = &[
        VulnerabilityType::SqlInjection,
        VulnerabilityType::Xss,
        VulnerabilityType::Csrf,
        VulnerabilityType::CommandInjection,
        VulnerabilityType::PathTraversal,
        VulnerabilityType::Ssti,
        VulnerabilityType::Xxe,
        VulnerabilityType::Ssrf,
        VulnerabilityType::OpenRedirect,
        VulnerabilityType::CspMissing,
        VulnerabilityType::MimeSniffing,
    ];

    /// Wire tag, e.g. `SQL_INJECTION`.
    pub fn as_str(&self) -> &str {
        match self {
            VulnerabilityType::SqlInjection => "SQL_INJECTION",
            VulnerabilityType::Xss => "XSS",
            VulnerabilityType::Csrf => "CSRF",
            VulnerabilityType::CommandInjection => "COMMAND_INJECTION",
            VulnerabilityType::PathTraversal => "PATH_TRAVERSAL",
            VulnerabilityType::Ssti => "SSTI",
            VulnerabilityType::Xxe => "XXE",
            VulnerabilityType::Ssrf => "SSRF",
            VulnerabilityType::OpenRedirect => "OPEN_REDIRECT",
            VulnerabilityType::CspMissing => "CSP_MISSING",
            VulnerabilityType::MimeSniffing => "MIME_SNIFFING",
            VulnerabilityType::Other(raw) => raw,
        }
    }

    /// Human-readable name for report headings.
    pub fn label(&self) -> &str {
        match self {
            VulnerabilityType::SqlInjection => "SQL Injection",
            VulnerabilityType::Xss => "Cross-Site Scripting",
            VulnerabilityType::Csrf => "Cross-Site Request Forgery",
            VulnerabilityType::CommandInjection => "Command Injection",
            VulnerabilityType::PathTraversal => "Path Traversal",
            VulnerabilityType::Ssti => "Server-Side Template Injection",
            VulnerabilityType::Xxe => "XML External Entity",
            VulnerabilityType::Ssrf => "Server-Side Request Forgery",
            VulnerabilityType::OpenRedirect => "Open Redirect",
            VulnerabilityType::CspMissing => "Missing Content-Security-Policy",
            VulnerabilityType::MimeSniffing => "MIME Sniffing",
            VulnerabilityType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VulnerabilityType::Other(_))
    }

    /// Ordered remediation steps. Never empty.
    pub fn remediation(&self) -> &'static [&'static str] {
        match self {
            VulnerabilityType::SqlInjection => &[
                "Use prepared statements for every query",
                "Bind parameters instead of concatenating input into SQL",
                "Validate and escape user input",
                "Prefer an ORM or query builder",
            ],
            VulnerabilityType::Xss => &[
                "Validate input and encode output",
                "Set a Content-Security-Policy header",
                "Mark session cookies HttpOnly and Secure",
                "Sanitize HTML with a vetted library (e.g. DOMPurify)",
            ],
            VulnerabilityType::Csrf => &[
                "Require CSRF tokens on state-changing requests",
                "Set the SameSite cookie attribute",
                "Validate the Origin / Referer header",
                "Require re-authentication for sensitive actions",
            ],
            VulnerabilityType::CommandInjection => &[
                "Never build system commands from user input",
                "Validate input against an allow-list",
                "Escape shell metacharacters",
                "Run services with least privilege",
            ],
            VulnerabilityType::PathTraversal => &[
                "Normalize and validate file paths",
                "Restrict accessible paths to an allow-list",
                "Reject relative path segments",
                "Block access outside the web root",
            ],
            VulnerabilityType::Ssti => &[
                "Enable the template engine sandbox",
                "Never render user input as a template",
                "Use the engine's safe rendering functions",
                "Validate and escape input",
            ],
            VulnerabilityType::Xxe => &[
                "Disable XML external entity resolution",
                "Use a hardened XML parser",
                "Validate XML input",
                "Consider JSON or another format instead of XML",
            ],
            VulnerabilityType::Ssrf => &[
                "Block requests to internal IP ranges",
                "Validate outbound URLs against an allow-list",
                "Limit redirects",
                "Enforce network-level egress controls",
            ],
            VulnerabilityType::OpenRedirect => &[
                "Validate redirect targets against an allow-list",
                "Restrict redirects to external URLs",
                "Add a user confirmation step",
                "Allow relative paths only",
            ],
            VulnerabilityType::CspMissing => &[
                "Set a Content-Security-Policy header",
                "Restrict inline scripts",
                "Allow scripts by nonce or hash",
                "Limit external resource loading",
            ],
            VulnerabilityType::MimeSniffing => &[
                "Set X-Content-Type-Options: nosniff",
                "Send accurate Content-Type headers",
                "Harden file upload validation",
                "Allow-list permitted file extensions",
            ],
            VulnerabilityType::Other(_) => GENERIC_REMEDIATION,
        }
    }
}

impl std::fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for VulnerabilityType {
    fn from(value: &str) -> Self {
        let tag = value.trim().to_uppercase().replace(['-', ' '], "_");
        match tag.as_str() {
            "SQL_INJECTION" | "SQLI" => VulnerabilityType::SqlInjection,
            "XSS" => VulnerabilityType::Xss,
            "CSRF" => VulnerabilityType::Csrf,
            "COMMAND_INJECTION" => VulnerabilityType::CommandInjection,
            "PATH_TRAVERSAL" => VulnerabilityType::PathTraversal,
            "SSTI" => VulnerabilityType::Ssti,
            "XXE" => VulnerabilityType::Xxe,
            "SSRF" => VulnerabilityType::Ssrf,
            "OPEN_REDIRECT" => VulnerabilityType::OpenRedirect,
            "CSP_MISSING" => VulnerabilityType::CspMissing,
            "MIME_SNIFFING" => VulnerabilityType::MimeSniffing,
            _ => VulnerabilityType::Other(value.to_string()),
        }
    }
}

impl From<String> for VulnerabilityType {
    fn from(value: String) -> Self {
        VulnerabilityType::from(value.as_str())
    }
}

/// An absent or empty tag.
impl Default for VulnerabilityType {
    fn default() -> Self {
        VulnerabilityType::Other(String::new())
    }
}

/// Strings go through [`From<&str>`]; numbers keep their text, anything else
/// is an empty `Other`.
impl<'de> Deserialize<'de> for VulnerabilityType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(tag) => VulnerabilityType::from(tag.as_str()),
            Value::Number(n) => VulnerabilityType::Other(n.to_string()),
            _ => VulnerabilityType::default(),
        })
    }
}

impl From<VulnerabilityType> for String {
    fn from(value: VulnerabilityType) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types_have_specific_guidance() {
        for kind in VulnerabilityType::KNOWN {
            assert!(kind.is_known());
            let steps = kind.remediation();
            assert_eq!(steps.len(), 4, "{kind}");
            assert_ne!(steps, GENERIC_REMEDIATION);
        }
    }

    #[test]
    fn test_unknown_type_falls_back() {
        for raw in ["LDAP_INJECTION", "", "   ", "💥"] {
            let kind = VulnerabilityType::from(raw);
            assert!(!kind.is_known());
            assert_eq!(kind.remediation(), GENERIC_REMEDIATION);
        }
    }

    #[test]
    fn test_tag_normalisation_keeps_raw_for_other() {
        assert_eq!(VulnerabilityType::from("sql-injection"), VulnerabilityType::SqlInjection);
        assert_eq!(VulnerabilityType::from("open redirect"), VulnerabilityType::OpenRedirect);
        assert_eq!(VulnerabilityType::from("Clickjacking").as_str(), "Clickjacking");
    }

    #[test]
    fn test_serde_roundtrips_wire_tag() {
        let kind: VulnerabilityType = serde_json::from_str("\"CSP_MISSING\"").unwrap();
        assert_eq!(kind, VulnerabilityType::CspMissing);
        assert_eq!(serde_json::to_string(&VulnerabilityType::Xxe).unwrap(), "\"XXE\"");
    }

    #[test]
    fn test_malformed_tag_becomes_other() {
        let kind: VulnerabilityType = serde_json::from_str("null").unwrap();
        assert_eq!(kind, VulnerabilityType::Other(String::new()));
        assert_eq!(kind.remediation(), GENERIC_REMEDIATION);

        let kind: VulnerabilityType = serde_json::from_str("42").unwrap();
        assert_eq!(kind.as_str(), "42");
    }
}
