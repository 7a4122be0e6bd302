use crate::db::schema::{Column, TableSchema};
use regex::Regex;
use std::sync::LazyLock;

static CREATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CREATE\s+TABLE").expect("valid CREATE TABLE pattern"));

// Table name (possibly quoted and schema-qualified) followed by the column body
static TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:IF\s+NOT\s+EXISTS\s+)?([A-Za-z0-9_\[\]".]+)\s*\(([\s\S]+?)\)\s*;"#)
        .expect("valid table header pattern")
});

// Table-level constraints; the keyword must stand alone so `unique_code` is a column
static CONSTRAINT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:PRIMARY\s+KEY|CONSTRAINT|FOREIGN\s+KEY|UNIQUE|CHECK)(?:\s|\(|$)")
        .expect("valid constraint line pattern")
});

/// Builds a schema from `CREATE TABLE` statements without touching a database.
///
/// Each non-empty line of a table body is read as `name type ...`; table-level
/// constraint lines are skipped. Statements that do not look like
/// `CREATE TABLE name (...);` are ignored.
pub fn parse_ddl(ddl: &str) -> TableSchema {
    let mut schema = TableSchema::new();

    for block in CREATE_TABLE.split(ddl).skip(1) {
        let Some(header) = TABLE_HEADER.captures(block) else {
            continue;
        };

        let table = unquote(header[1].rsplit('.').next().unwrap_or(&header[1]));
        let columns = header[2]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !CONSTRAINT_LINE.is_match(line))
            .map(|line| {
                let clean = line.trim_end_matches(',');
                let mut parts = clean.split_whitespace();
                let name = parts.next().map(unquote).unwrap_or_default();
                let data_type = parts.next().unwrap_or("UNKNOWN").trim_end_matches(',');
                Column::new(name, data_type)
            })
            .collect();

        schema.insert(table, columns);
    }

    schema
}

fn unquote(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"'))
        .collect()
}
