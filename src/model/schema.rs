//! Schema model: backing tables (`Source`) and logical columns (`Column`).
//!
//! A column records every source it physically lives in. Two sources that
//! share a column id can be joined on that column; the resolver never
//! matches by name.
//!
//! Construction happens in two phases:
//! - Phase 1: declare sources and columns ([`SchemaBuilder::add_source`],
//!   [`SchemaBuilder::add_column`])
//! - Phase 2: [`SchemaBuilder::build`] populates every source's column index
//!   in declaration order and derives the join graph

use std::collections::HashMap;

use petgraph::algo::{astar, has_path_connecting};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during schema construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate source name: {0}")]
    DuplicateSource(String),

    #[error("Duplicate column declaration: {0}")]
    DuplicateColumn(String),

    #[error("Column '{0}' must live in at least one source")]
    ColumnWithoutSources(String),

    #[error("Source not found: {0}")]
    UnknownSource(String),

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Ambiguous join key: source '{source_name}' exposes more than one column named '{column}'")]
    AmbiguousColumn { source_name: String, column: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

// ============================================================================
// Identity
// ============================================================================

/// Stable source identity, assigned at declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(usize);

/// Stable column identity, assigned at declaration.
///
/// Every source a column lives in refers to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column#{}", self.0)
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A backing table. `name` doubles as the SQL table name.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    /// Columns this table exposes, in column declaration order.
    pub columns: Vec<ColumnId>,
}

/// A logical field.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    /// Declaration handle, unique within the schema.
    pub key: String,
    /// SQL column name.
    pub name: String,
    /// Sources this column physically exists in, never empty.
    pub sources: Vec<SourceId>,
}

impl Column {
    /// True when the column lives in more than one source.
    pub fn is_multi_homed(&self) -> bool {
        self.sources.len() > 1
    }
}

/// One hop of a join path: `to` joins `from` on the shared column `via`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinHop {
    pub from: SourceId,
    pub to: SourceId,
    pub via: ColumnId,
}

// ============================================================================
// Builder
// ============================================================================

/// Declares sources and columns, then builds an immutable [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    sources: Vec<Source>,
    columns: Vec<Column>,
    source_index: HashMap<String, SourceId>,
    column_index: HashMap<String, ColumnId>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a source. Names must be unique.
    pub fn add_source(&mut self, name: &str) -> SchemaResult<SourceId> {
        if self.source_index.contains_key(name) {
            return Err(SchemaError::DuplicateSource(name.to_string()));
        }
        let id = SourceId(self.sources.len());
        self.sources.push(Source {
            id,
            name: name.to_string(),
            columns: Vec::new(),
        });
        self.source_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Declare a column whose handle is its SQL name.
    pub fn add_column(&mut self, name: &str, sources: &[SourceId]) -> SchemaResult<ColumnId> {
        self.add_keyed_column(name, name, sources)
    }

    /// Declare a column under a handle distinct from its SQL name.
    ///
    /// Lets two unrelated columns share a SQL name (each table's own
    /// `user_id`, say) while staying distinct declarations.
    pub fn add_keyed_column(
        &mut self,
        key: &str,
        name: &str,
        sources: &[SourceId],
    ) -> SchemaResult<ColumnId> {
        if self.column_index.contains_key(key) {
            return Err(SchemaError::DuplicateColumn(key.to_string()));
        }
        if sources.is_empty() {
            return Err(SchemaError::ColumnWithoutSources(key.to_string()));
        }

        let mut homes = Vec::with_capacity(sources.len());
        for source in sources {
            if source.0 >= self.sources.len() {
                return Err(SchemaError::UnknownSource(source.to_string()));
            }
            if !homes.contains(source) {
                homes.push(*source);
            }
        }

        let id = ColumnId(self.columns.len());
        self.columns.push(Column {
            id,
            key: key.to_string(),
            name: name.to_string(),
            sources: homes,
        });
        self.column_index.insert(key.to_string(), id);
        Ok(id)
    }

    /// Look up a declared source by name.
    pub fn source_id(&self, name: &str) -> Option<SourceId> {
        self.source_index.get(name).copied()
    }

    /// Phase 2: index columns per source and derive the join graph.
    pub fn build(mut self) -> SchemaResult<Schema> {
        for column in &self.columns {
            for source_id in &column.sources {
                let source = &mut self.sources[source_id.0];
                let clash = source
                    .columns
                    .iter()
                    .any(|existing| self.columns[existing.0].name == column.name);
                if clash {
                    return Err(SchemaError::AmbiguousColumn {
                        source_name: source.name.clone(),
                        column: column.name.clone(),
                    });
                }
                source.columns.push(column.id);
            }
        }

        let mut join_graph = UnGraph::with_capacity(self.sources.len(), 0);
        let nodes: Vec<NodeIndex> = self
            .sources
            .iter()
            .map(|source| join_graph.add_node(source.id))
            .collect();
        for column in self.columns.iter().filter(|c| c.is_multi_homed()) {
            for (i, a) in column.sources.iter().enumerate() {
                for b in &column.sources[i + 1..] {
                    join_graph.add_edge(nodes[a.0], nodes[b.0], column.id);
                }
            }
        }

        Ok(Schema {
            sources: self.sources,
            columns: self.columns,
            source_index: self.source_index,
            column_index: self.column_index,
            join_graph,
            nodes,
        })
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Immutable, process-wide schema.
///
/// Sources are graph nodes; every pair of sources sharing a column gets an
/// undirected edge labelled with that column.
#[derive(Debug, Clone)]
pub struct Schema {
    sources: Vec<Source>,
    columns: Vec<Column>,
    source_index: HashMap<String, SourceId>,
    column_index: HashMap<String, ColumnId>,
    join_graph: UnGraph<SourceId, ColumnId>,
    nodes: Vec<NodeIndex>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.0)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0)
    }

    /// Source lookup that reports a missing id as an error.
    pub fn require_source(&self, id: SourceId) -> SchemaResult<&Source> {
        self.source(id)
            .ok_or_else(|| SchemaError::UnknownSource(id.to_string()))
    }

    /// Column lookup that reports a missing id as an error.
    pub fn require_column(&self, id: ColumnId) -> SchemaResult<&Column> {
        self.column(id)
            .ok_or_else(|| SchemaError::UnknownColumn(id.to_string()))
    }

    pub fn source_by_name(&self, name: &str) -> Option<&Source> {
        self.source_index.get(name).and_then(|id| self.source(*id))
    }

    /// Column by declaration handle.
    pub fn column_by_key(&self, key: &str) -> Option<&Column> {
        self.column_index.get(key).and_then(|id| self.column(*id))
    }

    /// Column exposed by `source` under the SQL name `name`.
    pub fn column_in(&self, source: SourceId, name: &str) -> Option<&Column> {
        self.source(source)?
            .columns
            .iter()
            .filter_map(|id| self.column(*id))
            .find(|column| column.name == name)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Whether `to` can be reached from `from` through any chain of shared columns.
    pub fn is_reachable(&self, from: SourceId, to: SourceId) -> bool {
        match (self.nodes.get(from.0), self.nodes.get(to.0)) {
            (Some(a), Some(b)) => has_path_connecting(&self.join_graph, *a, *b, None),
            _ => false,
        }
    }

    /// Shortest chain of joins from `from` to `to`, if one exists.
    ///
    /// An empty path means `from == to`.
    pub fn join_path(&self, from: SourceId, to: SourceId) -> Option<Vec<JoinHop>> {
        let start = *self.nodes.get(from.0)?;
        let goal = *self.nodes.get(to.0)?;

        let (_, path) = astar(&self.join_graph, start, |n| n == goal, |_| 1, |_| 0)?;

        path.windows(2)
            .map(|pair| {
                let edge = self.join_graph.edges(pair[0]).find(|e| {
                    let other = if e.source() == pair[0] {
                        e.target()
                    } else {
                        e.source()
                    };
                    other == pair[1]
                })?;
                Some(JoinHop {
                    from: self.join_graph[pair[0]],
                    to: self.join_graph[pair[1]],
                    via: *edge.weight(),
                })
            })
            .collect()
    }
}
