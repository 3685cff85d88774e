//! Content negotiation for the JSON-RPC endpoint.

use regex::Regex;

use crate::errors::BindError;

pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Header rules derived from a single configured media type.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    media_type: String,
    content_type: Regex,
    accept: Regex,
}

impl HeaderMatcher {
    pub fn new(media_type: &str) -> Result<Self, BindError> {
        let media_type = media_type.trim();
        let shape = Regex::new(r"^[A-Za-z0-9!#$&^_.+-]+/[A-Za-z0-9!#$&^_.+-]+$")
            .map_err(|_| BindError::InvalidMediaType(media_type.to_string()))?;
        if !shape.is_match(media_type) {
            return Err(BindError::InvalidMediaType(media_type.to_string()));
        }

        let escaped = regex::escape(media_type);
        let content_type = Regex::new(&format!(r"(?i)^\s*{escaped}\s*(;.*)?$"))
            .map_err(|_| BindError::InvalidMediaType(media_type.to_string()))?;
        let accept = Regex::new(&format!(r"(?i)(^|,)\s*{escaped}\s*(;[^,]*)?(,|$)"))
            .map_err(|_| BindError::InvalidMediaType(media_type.to_string()))?;

        Ok(Self {
            media_type: media_type.to_ascii_lowercase(),
            content_type,
            accept,
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The media type optionally followed by `;` parameters.
    pub fn content_type_matches(&self, value: Option<&str>) -> bool {
        value.is_some_and(|value| self.content_type.is_match(value))
    }

    /// The media type listed as one of the comma-separated entries.
    pub fn accept_matches(&self, value: Option<&str>) -> bool {
        value.is_some_and(|value| self.accept.is_match(value))
    }
}

impl Default for HeaderMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_TYPE).expect("default media type is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json() -> HeaderMatcher {
        HeaderMatcher::default()
    }

    #[test]
    fn content_type_accepts_parameters() {
        let matcher = json();
        assert!(matcher.content_type_matches(Some("application/json")));
        assert!(matcher.content_type_matches(Some("application/json; charset=utf-8")));
        assert!(matcher.content_type_matches(Some("Application/JSON;charset=UTF-8")));
    }

    #[test]
    fn content_type_rejects_other_types() {
        let matcher = json();
        assert!(!matcher.content_type_matches(None));
        assert!(!matcher.content_type_matches(Some("")));
        assert!(!matcher.content_type_matches(Some("text/plain")));
        assert!(!matcher.content_type_matches(Some("application/jsonp")));
        assert!(!matcher.content_type_matches(Some("application/json-seq")));
        assert!(!matcher.content_type_matches(Some("text/html, application/json")));
    }

    #[test]
    fn accept_finds_entry_in_list() {
        let matcher = json();
        assert!(matcher.accept_matches(Some("application/json")));
        assert!(matcher.accept_matches(Some("text/html, application/json;q=0.9")));
        assert!(matcher.accept_matches(Some("application/json,text/plain")));
    }

    #[test]
    fn accept_requires_explicit_entry() {
        let matcher = json();
        assert!(!matcher.accept_matches(None));
        assert!(!matcher.accept_matches(Some("*/*")));
        assert!(!matcher.accept_matches(Some("application/*")));
        assert!(!matcher.accept_matches(Some("text/html, application/jsonp")));
    }

    #[test]
    fn custom_media_type_is_escaped() {
        let matcher = HeaderMatcher::new("application/vnd.rpc+json").expect("valid media type");
        assert!(matcher.content_type_matches(Some("application/vnd.rpc+json")));
        assert!(!matcher.content_type_matches(Some("application/vndXrpc+json")));
        assert!(!matcher.content_type_matches(Some("application/json")));
        assert_eq!(matcher.media_type(), "application/vnd.rpc+json");
    }

    #[test]
    fn malformed_media_type_fails() {
        for candidate in ["", "json", "application/", "a/b/c", "text/ plain"] {
            assert!(
                matches!(
                    HeaderMatcher::new(candidate),
                    Err(BindError::InvalidMediaType(_))
                ),
                "{candidate:?} should be rejected"
            );
        }
    }
}
