//! Table definitions and insert templates for the Redshift tables.
//!
//! Every statement is generated from [`DATA_COLUMNS`], so the metric columns
//! appear in the same order in both tables and in both the create and insert
//! statements.

use crate::template::{render, Params};

pub const TESTS_TABLE: &str = "latest_wpt_tests";
pub const RUNS_TABLE: &str = "latest_wpt_runs";

pub const DATA_COLUMNS: [&str; 16] = [
    "first_view_first_byte",
    "first_view_start_render",
    "first_view_load",
    "first_view_speed_index",
    "first_view_fully_loaded",
    "first_view_bytes",
    "first_view_requests",
    "first_view_connections",
    "repeat_view_first_byte",
    "repeat_view_start_render",
    "repeat_view_load",
    "repeat_view_speed_index",
    "repeat_view_fully_loaded",
    "repeat_view_bytes",
    "repeat_view_requests",
    "repeat_view_connections",
];

const DATA_COLUMN_TYPE: &str = "INTEGER NOT NULL ENCODE zstd";

pub const TESTS_IDENTITY_COLUMNS: [(&str, &str); 9] = [
    ("time", "TIMESTAMP NOT NULL SORTKEY"),
    ("id", "VARCHAR(32) NOT NULL DISTKEY ENCODE zstd"),
    ("label", "VARCHAR(64) NOT NULL ENCODE zstd"),
    ("location", "VARCHAR(64) NOT NULL ENCODE zstd"),
    ("browser", "VARCHAR(32) NOT NULL ENCODE zstd"),
    ("connection", "VARCHAR(32) NOT NULL ENCODE zstd"),
    ("runs", "SMALLINT NOT NULL ENCODE zstd"),
    ("git_repo", "VARCHAR(64) NOT NULL ENCODE zstd"),
    ("git_hash", "VARCHAR(40) NOT NULL ENCODE zstd"),
];

pub const RUNS_IDENTITY_COLUMNS: [(&str, &str); 2] = [
    ("test", "VARCHAR(32) NOT NULL SORTKEY DISTKEY ENCODE zstd"),
    ("index", "SMALLINT NOT NULL ENCODE zstd"),
];

/// Statement-level placeholder that receives the rendered value tuples.
pub const ROWS_KEY: &str = "rows";

/// `first_view_first_byte` -> `firstViewFirstByte`. Only an underscore
/// followed by a lowercase letter is folded, anything else is kept as is.
pub fn template_key(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut chars = column.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_lowercase() {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// An insert statement split into the statement shell and the per-row value
/// tuple, so any number of rows can go out as a single statement.
#[derive(Debug, Clone)]
pub struct InsertTemplate {
    pub statement: String,
    pub row: String,
}

impl InsertTemplate {
    fn build(table: &str, identity: &[(&str, &str)]) -> Self {
        let columns: Vec<&str> = identity
            .iter()
            .map(|(name, _)| *name)
            .chain(DATA_COLUMNS.iter().copied())
            .collect();

        let names = columns.join(",\n      ");
        let placeholders = columns
            .iter()
            .map(|c| format!("{{{{{}}}}}", template_key(c)))
            .collect::<Vec<_>>()
            .join(",\n      ");

        Self {
            statement: format!(
                "INSERT INTO {} (\n      {}\n    ) VALUES\n{{{{{}}}}};",
                table, names, ROWS_KEY
            ),
            row: format!("    (\n      {}\n    )", placeholders),
        }
    }

    /// Renders every row and splices them into the statement. Returns `None`
    /// when there is nothing to insert.
    pub fn render(&self, rows: &[Params]) -> Option<String> {
        if rows.is_empty() {
            return None;
        }
        let tuples = rows
            .iter()
            .map(|p| render(&self.row, p))
            .collect::<Vec<_>>()
            .join(",\n");
        let mut shell = Params::new();
        shell.insert(ROWS_KEY.to_string(), tuples);
        Some(render(&self.statement, &shell))
    }
}

#[derive(Debug, Clone)]
pub struct Queries {
    pub create_tests: String,
    pub create_runs: String,
    pub insert_tests: InsertTemplate,
    pub insert_runs: InsertTemplate,
}

impl Queries {
    pub fn new() -> Self {
        Self {
            create_tests: create_table(TESTS_TABLE, &TESTS_IDENTITY_COLUMNS),
            create_runs: create_table(RUNS_TABLE, &RUNS_IDENTITY_COLUMNS),
            insert_tests: InsertTemplate::build(TESTS_TABLE, &TESTS_IDENTITY_COLUMNS),
            insert_runs: InsertTemplate::build(RUNS_TABLE, &RUNS_IDENTITY_COLUMNS),
        }
    }
}

impl Default for Queries {
    fn default() -> Self {
        Self::new()
    }
}

fn create_table(table: &str, identity: &[(&str, &str)]) -> String {
    let columns = identity
        .iter()
        .map(|(name, ty)| format!("{} {}", name, ty))
        .chain(DATA_COLUMNS.iter().map(|c| format!("{} {}", c, DATA_COLUMN_TYPE)))
        .collect::<Vec<_>>()
        .join(",\n      ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n      {}\n    );",
        table, columns
    )
}
