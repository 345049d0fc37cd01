use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One stored credential.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Record {
    id: i64,
    pass: String,
    site: String,
}

impl Record {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn pass(&self) -> &str {
        &self.pass
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            site: self.site.clone(),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("site", &self.site)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Listing entry. Carries no secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: i64,
    pub site: String,
}

/// The `passwords` table: rows in insertion order plus the autoincrement
/// sequence, which only ever grows.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PasswordTable {
    #[serde(default)]
    seq: i64,
    #[serde(default)]
    rows: Vec<Record>,
}

impl PasswordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its id.
    pub fn insert(&mut self, site: &str, pass: &str) -> i64 {
        let max_id = self.rows.iter().map(Record::id).max().unwrap_or(0);
        let id = self.seq.max(max_id) + 1;
        self.seq = id;
        self.rows.push(Record {
            id,
            pass: pass.to_string(),
            site: site.to_string(),
        });
        id
    }

    /// Undoes the most recent insert if it produced `id`.
    pub(crate) fn rollback(&mut self, id: i64, previous_seq: i64) {
        if self.rows.last().map(Record::id) == Some(id) {
            self.rows.pop();
            self.seq = previous_seq;
        }
    }

    pub fn seq(&self) -> i64 {
        self.seq
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn list(&self) -> Vec<RecordSummary> {
        self.rows.iter().map(Record::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checks that ids are positive and unique.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for row in &self.rows {
            if !seen.insert(row.id) {
                return Err(format!("duplicate record id {}", row.id));
            }
            if row.id < 1 {
                return Err(format!("invalid record id {}", row.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_ids_from_one() {
        let mut table = PasswordTable::new();
        assert_eq!(table.insert("a.com", "pa"), 1);
        assert_eq!(table.insert("b.com", "pb"), 2);
        assert_eq!(table.insert("a.com", "pc"), 3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.seq(), 3);
    }

    #[test]
    fn test_get_returns_full_record() {
        let mut table = PasswordTable::new();
        let id = table.insert("example.com", "hunter2");
        let record = table.get(id).expect("record should exist");
        assert_eq!(record.id(), id);
        assert_eq!(record.site(), "example.com");
        assert_eq!(record.pass(), "hunter2");
    }

    #[test]
    fn test_get_missing_id() {
        let mut table = PasswordTable::new();
        table.insert("example.com", "hunter2");
        assert!(table.get(0).is_none());
        assert!(table.get(2).is_none());
        assert!(table.get(-1).is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut table = PasswordTable::new();
        table.insert("zeta", "1");
        table.insert("alpha", "2");
        let sites: Vec<_> = table.list().into_iter().map(|s| s.site).collect();
        assert_eq!(sites, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_rollback_restores_sequence() {
        let mut table = PasswordTable::new();
        table.insert("a", "1");
        let prev = table.seq();
        let id = table.insert("b", "2");
        table.rollback(id, prev);
        assert_eq!(table.len(), 1);
        assert_eq!(table.insert("c", "3"), 2);
    }

    #[test]
    fn test_sequence_never_reuses_ids() {
        let json = r#"{"seq": 10, "rows": [{"id": 4, "pass": "p", "site": "s"}]}"#;
        let mut table: PasswordTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.insert("next", "p"), 11);
    }

    #[test]
    fn test_max_id_wins_over_stale_sequence() {
        let json = r#"{"seq": 1, "rows": [{"id": 5, "pass": "p", "site": "s"}]}"#;
        let mut table: PasswordTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.insert("next", "p"), 6);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let json = r#"{"seq": 2, "rows": [
            {"id": 1, "pass": "p", "site": "s"},
            {"id": 1, "pass": "q", "site": "t"}
        ]}"#;
        let table: PasswordTable = serde_json::from_str(json).unwrap();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_pass() {
        let mut table = PasswordTable::new();
        let id = table.insert("example.com", "hunter2");
        let rendered = format!("{:?}", table.get(id).unwrap());
        assert!(rendered.contains("example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
