use crate::core::scope::TargetKind;
use crate::core::warehouse::Warehouse;
use crate::error::QueryError;

/// Column holding the object name in `SHOW DATABASES` and `SHOW WAREHOUSES`
const NAME_COLUMN: usize = 1;

/// Names of every object of one kind visible to the connected role
pub async fn list_targets<W: Warehouse + ?Sized>(
    conn: &W,
    kind: TargetKind,
) -> Result<Vec<String>, QueryError> {
    let sql = kind.enumeration_sql();
    tracing::debug!("Enumerating {}: {}", kind.plural(), sql);

    let table = conn.query(sql).await?;
    if !table.is_empty() && table.columns.len() <= NAME_COLUMN {
        return Err(QueryError::UnexpectedShape {
            sql: sql.to_string(),
            reason: format!("expected a name in column {}", NAME_COLUMN + 1),
        });
    }

    let names = table.column_strings(NAME_COLUMN);
    tracing::debug!("Found {} {}", names.len(), kind.plural());
    Ok(names)
}

pub async fn list_databases<W: Warehouse + ?Sized>(conn: &W) -> Result<Vec<String>, QueryError> {
    list_targets(conn, TargetKind::Database).await
}

pub async fn list_warehouses<W: Warehouse + ?Sized>(conn: &W) -> Result<Vec<String>, QueryError> {
    list_targets(conn, TargetKind::Warehouse).await
}
