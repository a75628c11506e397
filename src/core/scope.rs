//! Scope levels, target selections and sheet labels

use crate::error::CliError;
use std::fmt;
use std::str::FromStr;

/// Token that selects every discovered target.
pub const ALL_TARGETS: &str = "ALL";

/// Granularity at which Snowflake stores parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeLevel {
    Account,
    Session,
    Database,
    Warehouse,
}

impl ScopeLevel {
    /// Processing order of a collection run
    pub const ALL: [ScopeLevel; 4] = [
        ScopeLevel::Account,
        ScopeLevel::Session,
        ScopeLevel::Database,
        ScopeLevel::Warehouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeLevel::Account => "ACCOUNT",
            ScopeLevel::Session => "SESSION",
            ScopeLevel::Database => "DATABASE",
            ScopeLevel::Warehouse => "WAREHOUSE",
        }
    }

    /// Whether parameter queries at this level name a target object
    pub fn is_scoped(&self) -> bool {
        matches!(self, ScopeLevel::Database | ScopeLevel::Warehouse)
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACCOUNT" => Ok(ScopeLevel::Account),
            "SESSION" => Ok(ScopeLevel::Session),
            "DATABASE" => Ok(ScopeLevel::Database),
            "WAREHOUSE" => Ok(ScopeLevel::Warehouse),
            other => Err(CliError::InvalidArguments(format!(
                "Unknown level '{}'. Use ACCOUNT, SESSION, DATABASE or WAREHOUSE",
                other
            ))),
        }
    }
}

/// Set of requested levels, always iterated in [`ScopeLevel::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeSelection {
    levels: Vec<ScopeLevel>,
}

impl ScopeSelection {
    pub fn new<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = ScopeLevel>,
    {
        let mut levels: Vec<ScopeLevel> = levels.into_iter().collect();
        levels.sort();
        levels.dedup();
        Self { levels }
    }

    /// Preselected levels: ACCOUNT and SESSION
    pub fn default_levels() -> Self {
        Self::new([ScopeLevel::Account, ScopeLevel::Session])
    }

    pub fn contains(&self, level: ScopeLevel) -> bool {
        self.levels.contains(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[ScopeLevel] {
        &self.levels
    }

    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> Result<Self, CliError> {
        let levels = values
            .iter()
            .flat_map(|v| v.as_ref().split(','))
            .filter(|v| !v.trim().is_empty())
            .map(ScopeLevel::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(levels))
    }
}

impl fmt::Display for ScopeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.levels.iter().map(|l| l.as_str()).collect();
        if names.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}

/// Kind of object a scoped level targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Database,
    Warehouse,
}

impl TargetKind {
    pub fn level(&self) -> ScopeLevel {
        match self {
            TargetKind::Database => ScopeLevel::Database,
            TargetKind::Warehouse => ScopeLevel::Warehouse,
        }
    }

    pub fn enumeration_sql(&self) -> &'static str {
        match self {
            TargetKind::Database => "SHOW DATABASES",
            TargetKind::Warehouse => "SHOW WAREHOUSES",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            TargetKind::Database => "databases",
            TargetKind::Warehouse => "warehouses",
        }
    }
}

impl FromStr for TargetKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" | "databases" | "db" => Ok(TargetKind::Database),
            "warehouse" | "warehouses" | "wh" => Ok(TargetKind::Warehouse),
            other => Err(CliError::InvalidArguments(format!(
                "Unknown target kind '{}'. Use databases or warehouses",
                other
            ))),
        }
    }
}

/// The user's sub-selection among discovered targets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetChoice {
    #[default]
    All,
    Subset(Vec<String>),
}

impl TargetChoice {
    /// Any value equal to `ALL` selects everything, as in a multiselect that
    /// still has the `ALL` entry ticked.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        if values.iter().any(|v| v.as_ref() == ALL_TARGETS) {
            TargetChoice::All
        } else {
            TargetChoice::Subset(values.iter().map(|v| v.as_ref().to_string()).collect())
        }
    }
}

impl fmt::Display for TargetChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetChoice::All => f.write_str(ALL_TARGETS),
            TargetChoice::Subset(names) if names.is_empty() => f.write_str("(none)"),
            TargetChoice::Subset(names) => f.write_str(&names.join(", ")),
        }
    }
}

/// A chosen target after matching it against the discovered names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    Found(String),
    Unknown(String),
}

/// Discovered names plus the user's choice among them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetList {
    pub discovered: Vec<String>,
    pub choice: TargetChoice,
}

impl TargetList {
    pub fn new(discovered: Vec<String>, choice: TargetChoice) -> Self {
        Self { discovered, choice }
    }

    /// Targets to query, in order and without de-duplication.
    ///
    /// Subset names match discovered names exactly first, then
    /// case-insensitively when exactly one discovered name fits.
    pub fn resolve(&self) -> Vec<ResolvedTarget> {
        match &self.choice {
            TargetChoice::All => self
                .discovered
                .iter()
                .cloned()
                .map(ResolvedTarget::Found)
                .collect(),
            TargetChoice::Subset(names) => names.iter().map(|name| self.match_name(name)).collect(),
        }
    }

    fn match_name(&self, name: &str) -> ResolvedTarget {
        if self.discovered.iter().any(|d| d == name) {
            return ResolvedTarget::Found(name.to_string());
        }

        let mut folded = self
            .discovered
            .iter()
            .filter(|d| d.eq_ignore_ascii_case(name));
        match (folded.next(), folded.next()) {
            (Some(found), None) => ResolvedTarget::Found(found.clone()),
            _ => ResolvedTarget::Unknown(name.to_string()),
        }
    }
}

/// Result-set label for a level, with the object name for scoped levels
pub fn sheet_label(level: ScopeLevel, target: Option<&str>) -> String {
    match target {
        Some(name) => format!("{}_{}", level.as_str(), name),
        None => level.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_level_parse() {
        assert_eq!("account".parse::<ScopeLevel>().unwrap(), ScopeLevel::Account);
        assert_eq!(" WAREHOUSE ".parse::<ScopeLevel>().unwrap(), ScopeLevel::Warehouse);
        assert!("schema".parse::<ScopeLevel>().is_err());
    }

    #[test]
    fn test_selection_is_ordered_and_deduplicated() {
        let selection = ScopeSelection::new([
            ScopeLevel::Warehouse,
            ScopeLevel::Account,
            ScopeLevel::Warehouse,
        ]);
        assert_eq!(
            selection.levels(),
            &[ScopeLevel::Account, ScopeLevel::Warehouse]
        );
        assert_eq!(selection.to_string(), "ACCOUNT, WAREHOUSE");
    }

    #[test]
    fn test_selection_parse_all_accepts_commas() {
        let selection = ScopeSelection::parse_all(&["session,account", "database"]).unwrap();
        assert_eq!(
            selection.levels(),
            &[ScopeLevel::Account, ScopeLevel::Session, ScopeLevel::Database]
        );
        assert!(ScopeSelection::parse_all(&["account,nope"]).is_err());
        assert!(ScopeSelection::parse_all::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_default_levels() {
        let selection = ScopeSelection::default_levels();
        assert!(selection.contains(ScopeLevel::Account));
        assert!(selection.contains(ScopeLevel::Session));
        assert!(!selection.contains(ScopeLevel::Database));
    }

    #[test]
    fn test_target_choice_from_values() {
        assert_eq!(TargetChoice::from_values(&["DB1", "ALL"]), TargetChoice::All);
        assert_eq!(
            TargetChoice::from_values(&["DB2", "DB1"]),
            TargetChoice::Subset(vec!["DB2".to_string(), "DB1".to_string()])
        );
        assert_eq!(
            TargetChoice::from_values::<&str>(&[]),
            TargetChoice::Subset(vec![])
        );
    }

    #[test]
    fn test_resolve_all_uses_discovered_order() {
        let list = TargetList::new(
            vec!["DB1".to_string(), "DB2".to_string()],
            TargetChoice::All,
        );
        assert_eq!(
            list.resolve(),
            vec![
                ResolvedTarget::Found("DB1".to_string()),
                ResolvedTarget::Found("DB2".to_string())
            ]
        );
    }

    #[test]
    fn test_resolve_subset_preserves_order_and_duplicates() {
        let list = TargetList::new(
            vec!["DB1".to_string(), "DB2".to_string(), "Mixed".to_string()],
            TargetChoice::Subset(vec![
                "DB2".to_string(),
                "db1".to_string(),
                "DB2".to_string(),
                "MIXED".to_string(),
                "GONE".to_string(),
            ]),
        );
        assert_eq!(
            list.resolve(),
            vec![
                ResolvedTarget::Found("DB2".to_string()),
                ResolvedTarget::Found("DB1".to_string()),
                ResolvedTarget::Found("DB2".to_string()),
                ResolvedTarget::Found("Mixed".to_string()),
                ResolvedTarget::Unknown("GONE".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_ambiguous_case_fold_is_unknown() {
        let list = TargetList::new(
            vec!["Sales".to_string(), "SALES".to_string()],
            TargetChoice::Subset(vec!["sales".to_string()]),
        );
        assert_eq!(
            list.resolve(),
            vec![ResolvedTarget::Unknown("sales".to_string())]
        );
    }

    #[test]
    fn test_sheet_label() {
        assert_eq!(sheet_label(ScopeLevel::Account, None), "ACCOUNT");
        assert_eq!(
            sheet_label(ScopeLevel::Database, Some("DB1")),
            "DATABASE_DB1"
        );
    }
}
