//! Parameter collection
//!
//! One `SHOW PARAMETERS IN ...` statement per requested level and target.
//! Each statement is isolated: a failure is recorded against its sheet label
//! and collection moves on.

use super::types::{ResultSet, TargetOutcome};
use crate::core::scope::{ResolvedTarget, ScopeLevel, ScopeSelection, TargetList, sheet_label};
use crate::core::warehouse::Warehouse;
use crate::utils::validation::quote_identifier;

/// Statement for an unscoped level or for one named object
pub fn parameters_sql(level: ScopeLevel, identifier: Option<&str>) -> String {
    match identifier {
        Some(ident) => format!("SHOW PARAMETERS IN {} {}", level.as_str(), ident),
        None => format!("SHOW PARAMETERS IN {}", level.as_str()),
    }
}

/// Run every requested query in level order ACCOUNT, SESSION, DATABASE,
/// WAREHOUSE. Targets keep their given order and are not de-duplicated.
pub async fn collect<W: Warehouse + ?Sized>(
    conn: &W,
    selection: &ScopeSelection,
    databases: &TargetList,
    warehouses: &TargetList,
) -> ResultSet {
    let mut results = ResultSet::new();

    for &level in selection.levels() {
        match level {
            ScopeLevel::Account | ScopeLevel::Session => {
                let outcome = run(conn, &parameters_sql(level, None)).await;
                results.insert(sheet_label(level, None), outcome);
            }
            ScopeLevel::Database => collect_targets(conn, level, databases, &mut results).await,
            ScopeLevel::Warehouse => collect_targets(conn, level, warehouses, &mut results).await,
        }
    }

    tracing::debug!(
        "Collected {} of {} parameter tables",
        results.tables().count(),
        results.len()
    );
    results
}

async fn collect_targets<W: Warehouse + ?Sized>(
    conn: &W,
    level: ScopeLevel,
    targets: &TargetList,
    results: &mut ResultSet,
) {
    for target in targets.resolve() {
        let (name, outcome) = match target {
            ResolvedTarget::Found(name) => {
                let outcome = match quote_identifier(&name) {
                    Ok(ident) => run(conn, &parameters_sql(level, Some(&ident))).await,
                    Err(e) => failed(e.to_string()),
                };
                (name, outcome)
            }
            ResolvedTarget::Unknown(name) => {
                let reason = format!(
                    "{} '{}' was not found among the discovered names",
                    level.as_str().to_lowercase(),
                    name
                );
                (name, failed(reason))
            }
        };
        results.insert(sheet_label(level, Some(&name)), outcome);
    }
}

async fn run<W: Warehouse + ?Sized>(conn: &W, sql: &str) -> TargetOutcome {
    tracing::debug!("Executing: {}", sql);
    match conn.query(sql).await {
        Ok(table) => {
            tracing::debug!("{} returned {} rows", sql, table.row_count());
            TargetOutcome::Collected(table)
        }
        Err(e) => {
            tracing::warn!("{}", e);
            failed(e.to_string())
        }
    }
}

fn failed(reason: String) -> TargetOutcome {
    TargetOutcome::Failed { reason }
}
