//! Schema snapshots and execution results
//!
//! These types represent what the core hands back to its callers: a
//! point-in-time capture of a database's table/column structure, and the
//! normalized outcome of executing one SQL string.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Flat-text rendering used when the inspected database has no tables. The
/// model must not read an empty schema string as an invitation to invent one.
pub const EMPTY_SCHEMA_SENTINEL: &str = "The database is empty (no tables).";

/// Immutable snapshot of one column at inspection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    /// Column name.
    pub name: String,

    /// Declared type as text, e.g. "INTEGER", "VARCHAR(255)".
    pub data_type: String,
}

impl SchemaColumn {
    /// Human-readable leaf label, `"<name> (<type>)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.data_type)
    }
}

/// Columns of one table, in the catalog's declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Columns in declared order.
    pub columns: Vec<SchemaColumn>,
}

/// One table node of the tree rendering: a name plus its column leaf labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNode {
    /// Table name.
    pub name: String,

    /// Column leaf labels, `"<name> (<type>)"`, in declared order.
    pub columns: Vec<String>,
}

/// Point-in-time capture of a database's visible tables and columns.
///
/// Both renderings derive from the single enumeration pass that produced the
/// snapshot; neither goes back to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    /// Tables in stable (name) order.
    pub tables: Vec<TableSchema>,
}

impl SchemaSnapshot {
    /// Assemble a snapshot from a table listing plus a flat column listing
    /// ordered by (table, ordinal position).
    ///
    /// Declared types are uppercased so the spelling is deterministic for a
    /// fixed schema regardless of how the backend's catalog reports it.
    pub fn from_catalog(tables: Vec<String>, columns: Vec<(String, String, String)>) -> Self {
        let mut columns_by_table: HashMap<String, Vec<SchemaColumn>> = HashMap::new();
        for (table, name, data_type) in columns {
            columns_by_table.entry(table).or_default().push(SchemaColumn {
                name,
                data_type: data_type.to_uppercase(),
            });
        }

        let tables = tables
            .into_iter()
            .map(|name| {
                let columns = columns_by_table.remove(&name).unwrap_or_default();
                TableSchema { name, columns }
            })
            .collect();

        Self { tables }
    }

    /// Flat text form for model prompting: one `Table <name>: [...]` line per
    /// table, newline-joined; the empty-schema sentinel when no tables exist.
    pub fn to_text(&self) -> String {
        if self.tables.is_empty() {
            return EMPTY_SCHEMA_SENTINEL.to_string();
        }

        self.tables
            .iter()
            .map(|table| {
                let columns = table
                    .columns
                    .iter()
                    .map(SchemaColumn::label)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Table {}: [{}]", table.name, columns)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tree form for UI display. A database with zero tables yields an empty
    /// list of nodes, never an absent value.
    pub fn tree(&self) -> Vec<TableNode> {
        self.tables
            .iter()
            .map(|table| TableNode {
                name: table.name.clone(),
                columns: table.columns.iter().map(SchemaColumn::label).collect(),
            })
            .collect()
    }
}

/// Normalized outcome of executing one SQL string.
///
/// A statement either produced a row set or it did not; callers must inspect
/// the tag rather than assume one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ExecutionResult {
    /// The statement returned rows. `columns` carries the labels exactly as
    /// the statement returned them (which may be renamed or computed), in
    /// result order; each row is an object keyed by those labels.
    #[serde(rename_all = "camelCase")]
    Rows {
        columns: Vec<String>,
        rows: Vec<serde_json::Value>,
    },

    /// The statement completed without producing rows (DML, DDL, or a batch
    /// whose final statement returned nothing).
    #[serde(rename_all = "camelCase")]
    Status { message: String, rows_affected: u64 },
}

impl ExecutionResult {
    /// Status record for a statement that produced no row set.
    pub fn status(rows_affected: u64) -> Self {
        ExecutionResult::Status {
            message: "Statement executed successfully.".to_string(),
            rows_affected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_snapshot() -> SchemaSnapshot {
        SchemaSnapshot::from_catalog(
            vec!["users".to_string()],
            vec![
                ("users".to_string(), "id".to_string(), "integer".to_string()),
                ("users".to_string(), "email".to_string(), "text".to_string()),
            ],
        )
    }

    #[test]
    fn flat_text_rendering() {
        assert_eq!(
            users_snapshot().to_text(),
            "Table users: [id (INTEGER), email (TEXT)]"
        );
    }

    #[test]
    fn empty_schema_renders_the_sentinel_and_an_empty_tree() {
        let snapshot = SchemaSnapshot::from_catalog(vec![], vec![]);
        assert_eq!(snapshot.to_text(), EMPTY_SCHEMA_SENTINEL);
        assert!(snapshot.tree().is_empty());
    }

    #[test]
    fn tree_rendering_has_one_node_per_table_with_column_leaves() {
        let tree = users_snapshot().tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "users");
        assert_eq!(tree[0].columns, vec!["id (INTEGER)", "email (TEXT)"]);
    }

    #[test]
    fn catalog_order_is_preserved() {
        let snapshot = SchemaSnapshot::from_catalog(
            vec!["b".to_string(), "a".to_string()],
            vec![
                ("a".to_string(), "z".to_string(), "int".to_string()),
                ("a".to_string(), "y".to_string(), "int".to_string()),
                ("b".to_string(), "x".to_string(), "int".to_string()),
            ],
        );
        let names: Vec<_> = snapshot.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        let a_columns: Vec<_> = snapshot.tables[1]
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(a_columns, vec!["z", "y"]);
    }

    #[test]
    fn table_without_columns_still_appears() {
        let snapshot = SchemaSnapshot::from_catalog(vec!["bare".to_string()], vec![]);
        assert_eq!(snapshot.to_text(), "Table bare: []");
    }

    #[test]
    fn execution_result_serializes_with_an_outcome_tag() {
        let rows = ExecutionResult::Rows {
            columns: vec!["id".to_string()],
            rows: vec![serde_json::json!({ "id": 1 })],
        };
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json["outcome"], "rows");
        assert_eq!(json["columns"][0], "id");

        let status = ExecutionResult::status(3);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["outcome"], "status");
        assert_eq!(json["rowsAffected"], 3);
    }
}
