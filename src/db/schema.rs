use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type name exactly as the catalog reports it
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Tables by name, each with its columns in ordinal order.
///
/// Tables keep the order they were inserted in; serializes as a JSON object
/// `{"table": [{"name": ..., "type": ...}, ...]}` in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    tables: Vec<(String, Vec<Column>)>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, or replaces the columns of an existing one in place.
    pub fn insert(&mut self, table: impl Into<String>, columns: Vec<Column>) {
        let table = table.into();
        match self.tables.iter_mut().find(|(name, _)| *name == table) {
            Some((_, existing)) => *existing = columns,
            None => self.tables.push((table, columns)),
        }
    }

    pub fn columns(&self, table: &str) -> Option<&[Column]> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.as_slice())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Column])> {
        self.tables
            .iter()
            .map(|(name, columns)| (name.as_str(), columns.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Column>)> for TableSchema {
    fn from_iter<I: IntoIterator<Item = (S, Vec<Column>)>>(iter: I) -> Self {
        let mut schema = TableSchema::new();
        for (table, columns) in iter {
            schema.insert(table, columns);
        }
        schema
    }
}

impl Serialize for TableSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (table, columns) in &self.tables {
            map.serialize_entry(table, columns)?;
        }
        map.end()
    }
}

/// Renders one `table(col type, ...)` line per table, in schema order.
pub fn summarize(schema: &TableSchema) -> String {
    schema
        .iter()
        .map(|(table, columns)| {
            let columns = columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({})", table, columns)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
