//! Session state of one controller instance
//!
//! Owned by the dispatcher task and mutated only by the tag-presence
//! controller. Not persisted; a restart starts with an empty session.

use serde::Serialize;

/// Sensor values meaning "no tag on the reader" (compared case-insensitively)
const ABSENT_VALUES: [&str; 2] = ["none", "unknown"];

/// Tags seen by the controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Most recently observed tag, mapped or not
    pub last_tag: Option<String>,

    /// Tag whose media is playing or paused
    ///
    /// Kept when the tag is removed so that presenting it again resumes.
    /// Replaced only by a different tag; cleared after an unmapped scan.
    pub current_tag: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Canonical tag id of a raw sensor value, or None if no tag is present
pub fn canonical_tag(value: &str) -> Option<&str> {
    if value.is_empty()
        || ABSENT_VALUES
            .iter()
            .any(|absent| value.eq_ignore_ascii_case(absent))
    {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values() {
        for value in ["", "none", "None", "NONE", "unknown", "Unknown"] {
            assert_eq!(canonical_tag(value), None, "'{}' should mean no tag", value);
        }
    }

    #[test]
    fn test_tag_values_are_literal() {
        assert_eq!(canonical_tag("AB12"), Some("AB12"));
        assert_eq!(canonical_tag("ab12"), Some("ab12"));
        assert_eq!(canonical_tag("nonexistent"), Some("nonexistent"));
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionState::new();
        assert!(session.last_tag.is_none());
        assert!(session.current_tag.is_none());
    }
}
