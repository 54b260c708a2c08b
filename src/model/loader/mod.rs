//! Catalog loader: schema and reports from a TOML declaration.
//!
//! ```toml
//! [sources.users]
//! [sources.user_webpages]
//!
//! [columns.UserId]
//! name = "user_id"
//! sources = ["users", "user_webpages"]
//!
//! [reports.users]
//! origin = "users"
//! get_url = "localhost:3000/reports/1{?userId}"
//! columns = [{ column = "UserId", display = "number" }]
//! filters = [{ name = "userId", columns = ["UserId"] }]
//! ```
//!
//! Column keys are declaration handles; `name` (the SQL column name)
//! defaults to the key. Declaration order in the document is preserved.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatherer::model::loader::load_catalog;
//! use std::path::Path;
//!
//! let catalog = load_catalog(Path::new("users.toml"))?;
//! let report = catalog.report("users").unwrap();
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use super::report::{DisplayType, Report};
use super::schema::{ColumnId, Schema, SchemaError};

/// Errors that can occur when loading a catalog.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// IO error reading file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML syntax or shape error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Schema construction failed
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Unknown source '{name}' referenced by {context}")]
    UnknownSource { name: String, context: String },

    #[error("Unknown column '{name}' referenced by {context}")]
    UnknownColumn { name: String, context: String },
}

/// Result type for catalog loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

// ============================================================================
// Document shape
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDoc {
    #[serde(default)]
    sources: IndexMap<String, SourceDoc>,
    #[serde(default)]
    columns: IndexMap<String, ColumnDoc>,
    #[serde(default)]
    reports: IndexMap<String, ReportDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceDoc {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnDoc {
    name: Option<String>,
    sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportDoc {
    origin: String,
    get_url: Option<String>,
    #[serde(default)]
    columns: Vec<ReportColumnDoc>,
    #[serde(default)]
    filters: Vec<FilterDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportColumnDoc {
    column: String,
    display: DisplayType,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterDoc {
    name: String,
    columns: Vec<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// A built schema plus the reports declared against it.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub schema: Schema,
    pub reports: IndexMap<String, Report>,
}

impl Catalog {
    pub fn report(&self, name: &str) -> Option<&Report> {
        self.reports.get(name)
    }
}

/// Load a catalog from a TOML file.
pub fn load_catalog(path: &Path) -> LoadResult<Catalog> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse a catalog from TOML text.
pub fn parse_catalog(content: &str) -> LoadResult<Catalog> {
    let doc: CatalogDoc = toml::from_str(content)?;

    // Phase 1: declare sources and columns
    let mut builder = Schema::builder();
    for name in doc.sources.keys() {
        builder.add_source(name)?;
    }
    for (key, column) in &doc.columns {
        let sources = column
            .sources
            .iter()
            .map(|name| {
                builder.source_id(name).ok_or_else(|| LoadError::UnknownSource {
                    name: name.clone(),
                    context: format!("column '{}'", key),
                })
            })
            .collect::<LoadResult<Vec<_>>>()?;
        let name = column.name.as_deref().unwrap_or(key);
        builder.add_keyed_column(key, name, &sources)?;
    }

    // Phase 2: index columns per source
    let schema = builder.build()?;

    let mut reports = IndexMap::with_capacity(doc.reports.len());
    for (name, report_doc) in doc.reports {
        let report = build_report(&schema, &name, report_doc)?;
        reports.insert(name, report);
    }

    Ok(Catalog { schema, reports })
}

fn build_report(schema: &Schema, name: &str, doc: ReportDoc) -> LoadResult<Report> {
    let context = format!("report '{}'", name);
    let origin = schema
        .source_by_name(&doc.origin)
        .ok_or_else(|| LoadError::UnknownSource {
            name: doc.origin.clone(),
            context: context.clone(),
        })?
        .id;

    let lookup = |key: &str| -> LoadResult<ColumnId> {
        schema
            .column_by_key(key)
            .map(|c| c.id)
            .ok_or_else(|| LoadError::UnknownColumn {
                name: key.to_string(),
                context: context.clone(),
            })
    };

    let mut report = Report::new(name, origin);
    for column in &doc.columns {
        report = report.with_column(lookup(&column.column)?, column.display);
    }
    for filter in &doc.filters {
        let columns = filter
            .columns
            .iter()
            .map(|key| lookup(key))
            .collect::<LoadResult<Vec<_>>>()?;
        report = report.with_filter(&filter.name, &columns);
    }
    if let Some(url) = &doc.get_url {
        report = report.with_get_url(url);
    }
    Ok(report)
}
