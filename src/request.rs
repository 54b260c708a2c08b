//! Per-request parameters: filter values and the optional sort.
//!
//! Parameters are an opaque name → value mapping. A filter is active only
//! when its name maps to a present, non-null value. The reserved names
//! `sortColumn` and `sortOrder` carry the sort specification.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::sql::SortDir;

/// Parameter naming the sort column.
pub const SORT_COLUMN: &str = "sortColumn";
/// Parameter naming the sort direction (`asc` or `desc`).
pub const SORT_ORDER: &str = "sortOrder";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Invalid sort order '{0}', expected 'asc' or 'desc'")]
    InvalidSortOrder(String),
}

pub type RequestResult<T> = Result<T, RequestError>;

/// Ordered name → value mapping supplied with one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams {
    values: IndexMap<String, Value>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored. Empty values (`a=`) are recorded as null, so
    /// they never activate a filter. Later duplicates overwrite earlier ones.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let values = url::form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| {
                let value = if value.is_empty() {
                    Value::Null
                } else {
                    Value::String(value.into_owned())
                };
                (name.into_owned(), value)
            })
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The value for `name` if present and not null.
    pub fn get_active(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_null())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Requested ordering of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub column: String,
    pub order: SortDir,
}

impl SortSpec {
    pub fn new(column: &str, order: SortDir) -> Self {
        Self {
            column: column.to_string(),
            order,
        }
    }

    /// Extract the sort from `sortColumn` / `sortOrder`.
    ///
    /// No `sortColumn` means no sort. `sortOrder` defaults to ascending and
    /// is matched case-insensitively.
    pub fn from_params(params: &RequestParams) -> RequestResult<Option<SortSpec>> {
        let Some(column) = params.get_active(SORT_COLUMN) else {
            return Ok(None);
        };
        let column = match column {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let order = match params.get_active(SORT_ORDER) {
            None => SortDir::Asc,
            Some(Value::String(s)) => parse_sort_dir(s)?,
            Some(other) => return Err(RequestError::InvalidSortOrder(other.to_string())),
        };

        Ok(Some(SortSpec { column, order }))
    }
}

fn parse_sort_dir(s: &str) -> RequestResult<SortDir> {
    match s.to_ascii_lowercase().as_str() {
        "asc" => Ok(SortDir::Asc),
        "desc" => Ok(SortDir::Desc),
        _ => Err(RequestError::InvalidSortOrder(s.to_string())),
    }
}
