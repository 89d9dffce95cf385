//! Ordered feature column list persisted next to the model

use serde::Deserialize;
use std::collections::HashSet;

/// The column contract between training and inference.
///
/// Order matters: position `i` in the list is feature index `i` of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    version: Option<String>,
    columns: Vec<String>,
}

/// Accepted on-disk layouts of the column artifact
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Versioned {
        version: String,
        columns: Vec<String>,
    },
    Plain(Vec<String>),
}

impl FeatureSchema {
    /// Build a schema, rejecting empty lists and duplicate names.
    pub fn new(columns: Vec<String>, version: Option<String>) -> Result<Self, String> {
        if columns.is_empty() {
            return Err("column list is empty".to_string());
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.trim().is_empty() {
                return Err("column list contains a blank name".to_string());
            }
            if !seen.insert(column.as_str()) {
                return Err(format!("column '{column}' is listed more than once"));
            }
        }

        Ok(Self { version, columns })
    }

    /// Parse either a JSON array of names or `{"version": .., "columns": [..]}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let file: SchemaFile =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid column list: {e}"))?;

        match file {
            SchemaFile::Versioned { version, columns } => Self::new(columns, Some(version)),
            SchemaFile::Plain(columns) => Self::new(columns, None),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}
