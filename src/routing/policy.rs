//! Typed policy bindings parsed from route configuration strings.
//!
//! # Design Decisions
//! - Reserved keywords are matched ASCII case-insensitively
//! - Parsing is a pure function; downstream code matches on the enum,
//!   never on strings
//! - An empty string means "no binding"

const DEFAULT_KEYWORD: &str = "default";
const DISABLE_KEYWORD: &str = "disable";

/// CORS binding attached to a dispatch entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CorsPolicy {
    /// The proxy-wide default CORS policy.
    Default,
    /// CORS explicitly disabled for this route.
    Disabled,
    /// A CORS policy registered under this name.
    Named(String),
    /// No CORS binding.
    #[default]
    Absent,
}

impl CorsPolicy {
    /// Resolve a configured CORS policy string. First match wins:
    /// `default`, `disable`, any other non-empty name, empty.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(DEFAULT_KEYWORD) {
            CorsPolicy::Default
        } else if value.eq_ignore_ascii_case(DISABLE_KEYWORD) {
            CorsPolicy::Disabled
        } else if !value.is_empty() {
            CorsPolicy::Named(value.to_string())
        } else {
            CorsPolicy::Absent
        }
    }

    /// Whether entries carrying this binding also match CORS preflight requests.
    pub fn accepts_preflight(&self) -> bool {
        !matches!(self, CorsPolicy::Absent)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CorsPolicy::Absent)
    }
}

/// Authorization binding attached to a dispatch entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum AuthorizationPolicy {
    /// Require an authenticated caller, no specific scheme.
    Default,
    /// An authorization policy registered under this name.
    Named(String),
    /// Open route.
    #[default]
    Absent,
}

impl AuthorizationPolicy {
    /// Resolve a configured authorization policy string.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(DEFAULT_KEYWORD) {
            AuthorizationPolicy::Default
        } else if !value.is_empty() {
            AuthorizationPolicy::Named(value.to_string())
        } else {
            AuthorizationPolicy::Absent
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AuthorizationPolicy::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_keywords_any_case() {
        for value in ["default", "Default", "DEFAULT", "dEfAuLt"] {
            assert_eq!(CorsPolicy::parse(value), CorsPolicy::Default);
        }
        for value in ["disable", "Disable", "DISABLE"] {
            assert_eq!(CorsPolicy::parse(value), CorsPolicy::Disabled);
        }
    }

    #[test]
    fn test_cors_named_and_absent() {
        assert_eq!(CorsPolicy::parse("custom1"), CorsPolicy::Named("custom1".into()));
        // Near-misses of the keywords are plain names.
        assert_eq!(CorsPolicy::parse("disabled"), CorsPolicy::Named("disabled".into()));
        assert_eq!(CorsPolicy::parse(""), CorsPolicy::Absent);
    }

    #[test]
    fn test_cors_preflight_flag() {
        assert!(CorsPolicy::Default.accepts_preflight());
        assert!(CorsPolicy::Disabled.accepts_preflight());
        assert!(CorsPolicy::Named("custom1".into()).accepts_preflight());
        assert!(!CorsPolicy::Absent.accepts_preflight());
    }

    #[test]
    fn test_authorization_resolution() {
        assert_eq!(AuthorizationPolicy::parse("Default"), AuthorizationPolicy::Default);
        assert_eq!(
            AuthorizationPolicy::parse("admins"),
            AuthorizationPolicy::Named("admins".into())
        );
        // `disable` is only reserved for CORS.
        assert_eq!(
            AuthorizationPolicy::parse("disable"),
            AuthorizationPolicy::Named("disable".into())
        );
        assert_eq!(AuthorizationPolicy::parse(""), AuthorizationPolicy::Absent);
    }
}
