//! Revision records.
//!
//! Revisions of a path are indexed by ordinal: 0 is the live working copy
//! (which, with per-save commits, is also the newest snapshot), 1 the
//! immediately preceding captured snapshot, increasing with age.

use serde::Serialize;

/// Maximum number of records returned by a revision query.
pub const MAX_REVISION_RECORDS: usize = 10;

/// One requested metadata field of a revision.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionField {
    /// Backend-native placeholder name (e.g. `ad`, `s`).
    pub name: String,
    /// Resolved value; empty for unknown names.
    pub value: String,
}

/// One revision of a versioned path.
///
/// The commit identifier is always present; `fields` carries exactly the
/// caller-requested metadata, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionRecord {
    /// Backend change-set identifier.
    pub commit: String,
    /// Requested fields, in request order.
    pub fields: Vec<RevisionField>,
}

impl RevisionRecord {
    /// Look up a requested field by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_field_by_name() {
        let record = RevisionRecord {
            commit: "abc123".to_string(),
            fields: vec![
                RevisionField {
                    name: "s".to_string(),
                    value: "Commit from Savepoint".to_string(),
                },
                RevisionField {
                    name: "ad".to_string(),
                    value: "Mon, 1 Jan 2024 00:00:00 +0000".to_string(),
                },
            ],
        };

        assert_eq!(record.get("s"), Some("Commit from Savepoint"));
        assert_eq!(record.get("missing"), None);
    }
}
