//! Report definitions.
//!
//! A report is rooted at an origin source, lists the columns it retrieves
//! together with a display hint, and declares named filters. A filter
//! matches when ANY of its candidate columns equals the supplied value.

use serde::{Deserialize, Serialize};

use super::schema::{ColumnId, Schema, SchemaResult, SourceId};
use crate::validation::{validate_report, ValidationError};

/// How a client should present a report column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Number,
    String,
    Link,
}

/// A column retrieved by a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub column: ColumnId,
    pub display: DisplayType,
}

/// A named filter: activated by the request parameter of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    /// Candidate columns, OR-ed together when the filter is active.
    pub columns: Vec<ColumnId>,
}

/// A report declaration. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub name: String,
    pub origin: SourceId,
    pub columns: Vec<ReportColumn>,
    pub filters: Vec<Filter>,
    /// Retrieval URL template, e.g. `localhost:3000/reports/1{?userId,freeSearch}`.
    pub get_url: Option<String>,
}

impl Report {
    pub fn new(name: &str, origin: SourceId) -> Self {
        Self {
            name: name.to_string(),
            origin,
            columns: Vec::new(),
            filters: Vec::new(),
            get_url: None,
        }
    }

    /// Add a retrieved column.
    pub fn with_column(mut self, column: ColumnId, display: DisplayType) -> Self {
        self.columns.push(ReportColumn { column, display });
        self
    }

    /// Add a named filter over one or more candidate columns.
    pub fn with_filter(mut self, name: &str, columns: &[ColumnId]) -> Self {
        self.filters.push(Filter {
            name: name.to_string(),
            columns: columns.to_vec(),
        });
        self
    }

    pub fn with_get_url(mut self, url: &str) -> Self {
        self.get_url = Some(url.to_string());
        self
    }

    /// Column ids in declaration order.
    pub fn column_ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.columns.iter().map(|c| c.column)
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Check that this report can be gathered against `schema`.
    pub fn validate(&self, schema: &Schema) -> Result<(), Vec<ValidationError>> {
        validate_report(schema, self)
    }

    /// Client-facing description of this report.
    pub fn describe(&self, schema: &Schema) -> SchemaResult<ReportDescription> {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Ok(ColumnDescription {
                    name: schema.require_column(c.column)?.name.clone(),
                    display: c.display,
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(ReportDescription {
            name: self.name.clone(),
            origin: schema.require_source(self.origin)?.name.clone(),
            get_url: self.get_url.clone(),
            filters: self.filters.iter().map(|f| f.name.clone()).collect(),
            columns,
        })
    }
}

/// Serializable report description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDescription {
    pub name: String,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_url: Option<String>,
    pub filters: Vec<String>,
    pub columns: Vec<ColumnDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub name: String,
    pub display: DisplayType,
}
