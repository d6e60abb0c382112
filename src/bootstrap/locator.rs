//! Locator extraction from the locator endpoint body.
//!
//! The endpoint is loosely typed. Extraction rules, in order:
//! 1. Body is a JSON string -> use it directly
//! 2. Body is an object with a string `url` field -> use it
//! 3. Body is an object -> first own value (insertion order) that is a
//!    string starting with `http`
//! 4. Anything else -> no candidate
//!
//! The candidate then has to pass the `http` prefix check to become a
//! [`Locator`].

use serde_json::Value;
use std::fmt;

use crate::error::{BootstrapError, BootstrapResult};

const HTTP_PREFIX: &str = "http";

/// Message used when no usable locator is found
pub const NO_VALID_URL: &str = "no valid URL found";

/// Shape the locator body arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorPayload {
    /// Body was a bare JSON string
    BareString(String),
    /// Body was an object with a string `url` field
    UrlField(String),
    /// Found by scanning the object's values
    ScannedValue(String),
    /// No candidate string found
    Missing,
}

impl LocatorPayload {
    /// Classify a parsed locator body.
    pub fn classify(body: &Value) -> Self {
        match body {
            Value::String(s) => LocatorPayload::BareString(s.clone()),
            Value::Object(map) => {
                if let Some(Value::String(url)) = map.get("url") {
                    return LocatorPayload::UrlField(url.clone());
                }
                map.values()
                    .find_map(|v| match v {
                        Value::String(s) if s.starts_with(HTTP_PREFIX) => Some(s.clone()),
                        _ => None,
                    })
                    .map(LocatorPayload::ScannedValue)
                    .unwrap_or(LocatorPayload::Missing)
            }
            _ => LocatorPayload::Missing,
        }
    }

    /// The candidate string, if any.
    pub fn candidate(&self) -> Option<&str> {
        match self {
            LocatorPayload::BareString(s)
            | LocatorPayload::UrlField(s)
            | LocatorPayload::ScannedValue(s) => Some(s),
            LocatorPayload::Missing => None,
        }
    }

    /// Validate the candidate into a [`Locator`].
    pub fn into_locator(self) -> BootstrapResult<Locator> {
        match self.candidate() {
            Some(candidate) => Locator::parse(candidate),
            None => Err(BootstrapError::Validation(NO_VALID_URL.to_string())),
        }
    }
}

/// A validated remote destination: a string starting with `http`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    /// Accept `candidate` if it starts with `http` (case-sensitive).
    pub fn parse(candidate: &str) -> BootstrapResult<Self> {
        if candidate.starts_with(HTTP_PREFIX) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(BootstrapError::Validation(format!(
                "{}: {:?}",
                NO_VALID_URL, candidate
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: &str) -> LocatorPayload {
        LocatorPayload::classify(&serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_classify_bare_string() {
        assert_eq!(
            parse(r#""https://x.test/b""#),
            LocatorPayload::BareString("https://x.test/b".to_string())
        );
    }

    #[test]
    fn test_classify_url_field() {
        assert_eq!(
            parse(r#"{"name": "https://other.test", "url": "https://x.test/u"}"#),
            LocatorPayload::UrlField("https://x.test/u".to_string())
        );
    }

    #[test]
    fn test_classify_url_field_without_http_is_not_scanned() {
        let payload = parse(r#"{"url": "ftp://x.test/c", "mirror": "https://x.test/m"}"#);
        assert_eq!(payload, LocatorPayload::UrlField("ftp://x.test/c".to_string()));
        assert!(payload.into_locator().is_err());
    }

    #[test]
    fn test_classify_non_string_url_falls_through_to_scan() {
        assert_eq!(
            parse(r#"{"url": 42, "link": "https://x.test/l"}"#),
            LocatorPayload::ScannedValue("https://x.test/l".to_string())
        );
    }

    #[test]
    fn test_scan_skips_non_http_strings() {
        assert_eq!(
            parse(r#"{"foo": 1, "title": "Farm", "bar": "https://x.test/a"}"#),
            LocatorPayload::ScannedValue("https://x.test/a".to_string())
        );
    }

    #[test]
    fn test_scan_uses_insertion_order() {
        assert_eq!(
            parse(r#"{"zeta": "https://first.test", "alpha": "https://second.test"}"#),
            LocatorPayload::ScannedValue("https://first.test".to_string())
        );
    }

    #[test]
    fn test_classify_missing() {
        assert_eq!(parse(r#"{"foo": 1, "bar": "ftp://x"}"#), LocatorPayload::Missing);
        assert_eq!(parse("{}"), LocatorPayload::Missing);
        assert_eq!(parse("null"), LocatorPayload::Missing);
        assert_eq!(parse("42"), LocatorPayload::Missing);
        assert_eq!(
            LocatorPayload::classify(&json!(["https://x.test/array"])),
            LocatorPayload::Missing
        );
    }

    #[test]
    fn test_missing_into_locator() {
        let err = LocatorPayload::Missing.into_locator().unwrap_err();
        assert_eq!(err, BootstrapError::Validation(NO_VALID_URL.to_string()));
    }

    #[test]
    fn test_locator_prefix_is_case_sensitive() {
        assert!(Locator::parse("https://x.test").is_ok());
        assert!(Locator::parse("http://x.test").is_ok());
        assert!(Locator::parse("HTTPS://x.test").is_err());
        assert!(Locator::parse("ftp://x.test").is_err());
        assert!(Locator::parse("").is_err());
    }

    #[test]
    fn test_bare_string_without_http_is_rejected() {
        assert!(parse(r#""x.test/home""#).into_locator().is_err());
    }
}
