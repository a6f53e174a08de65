//! Request and response bodies of the allow-list service.

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for the check endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CheckRequest<'a> {
    pub email: &'a str,
}

/// Request body for the usage endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UsageEvent<'a> {
    pub email: &'a str,
}

/// Response from the check endpoint.
///
/// The service has shipped the blacklist flag as both `isBlacklisted` and `is_blacklisted`.
/// Both spellings are accepted; when a body carries both, the one appearing last wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub exists: bool,
    #[serde(rename = "isBlacklisted")]
    pub is_blacklisted: bool,
}

const FIELD_EXISTS: &str = "exists";
const FIELD_BLACKLISTED_CAMEL: &str = "isBlacklisted";
const FIELD_BLACKLISTED_SNAKE: &str = "is_blacklisted";

impl<'de> Deserialize<'de> for CheckResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CheckResultVisitor)
    }
}

struct CheckResultVisitor;

impl<'de> Visitor<'de> for CheckResultVisitor {
    type Value = CheckResult;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with an `exists` flag")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut exists: Option<bool> = None;
        let mut is_blacklisted = false;

        // Walk keys in body order so the later blacklist spelling overwrites the earlier one
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                FIELD_EXISTS => exists = map.next_value::<Option<bool>>()?,
                FIELD_BLACKLISTED_CAMEL | FIELD_BLACKLISTED_SNAKE => {
                    is_blacklisted = map.next_value::<Option<bool>>()?.unwrap_or(false);
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        let exists = exists.ok_or_else(|| <A::Error as de::Error>::missing_field(FIELD_EXISTS))?;
        Ok(CheckResult { exists, is_blacklisted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_request_serialization() {
        let json = serde_json::to_string(&CheckRequest {
            email: "dev@example.com",
        })
        .unwrap();
        assert_eq!(json, r#"{"email":"dev@example.com"}"#);
    }

    #[test]
    fn test_usage_event_serialization() {
        let json = serde_json::to_string(&UsageEvent {
            email: "dev@example.com",
        })
        .unwrap();
        assert_eq!(json, r#"{"email":"dev@example.com"}"#);
    }

    #[test]
    fn test_camel_and_snake_blacklist_spellings_are_synonyms() {
        for flag in [true, false] {
            let camel: CheckResult =
                serde_json::from_str(&format!(r#"{{"exists": true, "isBlacklisted": {flag}}}"#)).unwrap();
            let snake: CheckResult =
                serde_json::from_str(&format!(r#"{{"exists": true, "is_blacklisted": {flag}}}"#)).unwrap();
            assert_eq!(camel, snake);
            assert_eq!(camel.is_blacklisted, flag);
        }
    }

    #[test]
    fn test_last_blacklist_spelling_wins() {
        let json = r#"{"exists": true, "isBlacklisted": false, "is_blacklisted": true}"#;
        let result: CheckResult = serde_json::from_str(json).unwrap();
        assert!(result.is_blacklisted);

        let json = r#"{"is_blacklisted": true, "exists": true, "isBlacklisted": false}"#;
        let result: CheckResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_blacklisted);
    }

    #[test]
    fn test_missing_blacklist_flag_means_not_blacklisted() {
        let result: CheckResult = serde_json::from_str(r#"{"exists": true}"#).unwrap();
        assert_eq!(
            result,
            CheckResult {
                exists: true,
                is_blacklisted: false
            }
        );
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{"exists": false, "plan": {"tier": "free"}, "tags": [1, 2]}"#;
        let result: CheckResult = serde_json::from_str(json).unwrap();
        assert!(!result.exists);
    }

    #[test]
    fn test_missing_exists_is_an_error() {
        let err = serde_json::from_str::<CheckResult>(r#"{"isBlacklisted": false}"#).unwrap_err();
        assert!(err.to_string().contains("exists"));

        assert!(serde_json::from_str::<CheckResult>(r#"{"exists": null}"#).is_err());
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        assert!(serde_json::from_str::<CheckResult>("[true, false]").is_err());
        assert!(serde_json::from_str::<CheckResult>("").is_err());
    }

    #[test]
    fn test_serializes_camel_case_flag() {
        let json = serde_json::to_value(CheckResult {
            exists: true,
            is_blacklisted: true,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"exists": true, "isBlacklisted": true}));
    }
}
