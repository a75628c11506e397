use crate::core::warehouse::ParameterTable;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::io::Cursor;

pub const EXPORT_FILE_NAME: &str = "snowflake_parameters.xlsx";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Outcome of one parameter query
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Collected(ParameterTable),
    Failed { reason: String },
}

impl TargetOutcome {
    pub fn table(&self) -> Option<&ParameterTable> {
        match self {
            TargetOutcome::Collected(table) => Some(table),
            TargetOutcome::Failed { .. } => None,
        }
    }
}

/// Sheet label to outcome, in collection order.
///
/// Inserting an existing label keeps its position and replaces the outcome.
#[derive(Debug, Clone)]
pub struct ResultSet {
    entries: IndexMap<String, TargetOutcome>,
    pub collected_at: DateTime<Utc>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSet {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            collected_at: Utc::now(),
        }
    }

    pub fn insert(&mut self, label: String, outcome: TargetOutcome) {
        self.entries.insert(label, outcome);
    }

    pub fn get(&self, label: &str) -> Option<&TargetOutcome> {
        self.entries.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetOutcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Successfully collected tables in order
    pub fn tables(&self) -> impl Iterator<Item = (&str, &ParameterTable)> {
        self.iter()
            .filter_map(|(label, outcome)| outcome.table().map(|t| (label, t)))
    }

    /// Failed targets in order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|(label, outcome)| match outcome {
            TargetOutcome::Failed { reason } => Some((label, reason.as_str())),
            TargetOutcome::Collected(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_tables(&self) -> bool {
        self.tables().next().is_some()
    }
}

/// An exported workbook ready to be written or sent
#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub file_name: String,
    pub mime_type: String,
    pub sheet_names: Vec<String>,
    pub bytes: Vec<u8>,
}

impl ExportedWorkbook {
    /// Reader positioned at the start of the document
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(value: &str) -> ParameterTable {
        ParameterTable::new(
            vec!["key".to_string()],
            vec![vec![serde_json::Value::from(value)]],
        )
    }

    #[test]
    fn test_result_set_preserves_order_and_replaces_duplicates() {
        let mut results = ResultSet::new();
        results.insert("ACCOUNT".to_string(), TargetOutcome::Collected(table("a")));
        results.insert("DATABASE_DB1".to_string(), TargetOutcome::Collected(table("first")));
        results.insert("SESSION".to_string(), TargetOutcome::Collected(table("s")));
        results.insert("DATABASE_DB1".to_string(), TargetOutcome::Collected(table("second")));

        let labels: Vec<&str> = results.labels().collect();
        assert_eq!(labels, vec!["ACCOUNT", "DATABASE_DB1", "SESSION"]);
        assert_eq!(
            results.get("DATABASE_DB1").and_then(|o| o.table()),
            Some(&table("second"))
        );
    }

    #[test]
    fn test_tables_and_failures_are_split() {
        let mut results = ResultSet::new();
        results.insert("ACCOUNT".to_string(), TargetOutcome::Collected(table("a")));
        results.insert(
            "WAREHOUSE_WH1".to_string(),
            TargetOutcome::Failed {
                reason: "denied".to_string(),
            },
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results.tables().count(), 1);
        assert_eq!(
            results.failures().collect::<Vec<_>>(),
            vec![("WAREHOUSE_WH1", "denied")]
        );
        assert!(results.has_tables());
    }

    #[test]
    fn test_empty_result_set() {
        let results = ResultSet::default();
        assert!(results.is_empty());
        assert!(!results.has_tables());
    }

    #[test]
    fn test_exported_workbook_reader_starts_at_zero() {
        let workbook = ExportedWorkbook {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime_type: XLSX_MIME_TYPE.to_string(),
            sheet_names: vec!["ACCOUNT".to_string()],
            bytes: vec![0x50, 0x4b],
        };
        assert_eq!(workbook.reader().position(), 0);
    }
}
