//! Validation of report declarations.
//!
//! Checks that a report can actually be gathered: every column resolves
//! from the origin in declaration order with the greedy resolver and every
//! filter has a candidate the resulting plan can qualify. Errors are
//! accumulated rather than stopping at the first one.

use crate::model::{ColumnId, Report, Schema, SourceId};
use crate::planner::{GreedyResolver, JoinPlan, JoinResolver, PlanError};

/// Validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Report retrieves no columns.
    NoColumns { report: String },
    /// Filter lists no candidate columns.
    EmptyFilter { report: String, filter: String },
    /// Two filters share a name.
    DuplicateFilter { report: String, filter: String },
    /// Column is reachable, but only through tables the report never requests.
    NeedsIntermediate {
        report: String,
        column: String,
        path: Vec<String>,
    },
    /// No chain of shared columns connects the column to the origin.
    Unreachable { report: String, column: String },
    /// No candidate of an active filter would have a table in the plan.
    UnqualifiableFilter { report: String, filter: String },
    /// Reference to something the schema does not declare.
    UndefinedReference { report: String, reference: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NoColumns { report } => {
                write!(f, "Report '{}' has no columns", report)
            }
            ValidationError::EmptyFilter { report, filter } => {
                write!(f, "Report '{}' filter '{}' has no columns", report, filter)
            }
            ValidationError::DuplicateFilter { report, filter } => {
                write!(f, "Report '{}' declares filter '{}' twice", report, filter)
            }
            ValidationError::NeedsIntermediate {
                report,
                column,
                path,
            } => {
                write!(
                    f,
                    "Report '{}' column '{}' is only reachable through {}; request a column from an intermediate table first",
                    report,
                    column,
                    path.join(" -> ")
                )
            }
            ValidationError::Unreachable { report, column } => {
                write!(
                    f,
                    "Report '{}' column '{}' shares no join key with the origin",
                    report, column
                )
            }
            ValidationError::UnqualifiableFilter { report, filter } => {
                write!(
                    f,
                    "Report '{}' filter '{}' has no column in any joined table",
                    report, filter
                )
            }
            ValidationError::UndefinedReference { report, reference } => {
                write!(f, "Report '{}' references undefined {}", report, reference)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a report against its schema.
pub fn validate_report(schema: &Schema, report: &Report) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if schema.source(report.origin).is_none() {
        errors.push(ValidationError::UndefinedReference {
            report: report.name.clone(),
            reference: report.origin.to_string(),
        });
        return Err(errors);
    }

    validate_filters_declared(report, &mut errors);
    let plan = validate_columns(schema, report, &mut errors);
    validate_filters_qualify(schema, report, &plan, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_filters_declared(report: &Report, errors: &mut Vec<ValidationError>) {
    for (i, filter) in report.filters.iter().enumerate() {
        if filter.columns.is_empty() {
            errors.push(ValidationError::EmptyFilter {
                report: report.name.clone(),
                filter: filter.name.clone(),
            });
        }
        if report.filters[..i].iter().any(|f| f.name == filter.name) {
            errors.push(ValidationError::DuplicateFilter {
                report: report.name.clone(),
                filter: filter.name.clone(),
            });
        }
    }
}

/// Resolve columns one at a time, keeping those that join; returns the plan
/// over the accepted columns.
fn validate_columns(
    schema: &Schema,
    report: &Report,
    errors: &mut Vec<ValidationError>,
) -> JoinPlan {
    if report.columns.is_empty() {
        errors.push(ValidationError::NoColumns {
            report: report.name.clone(),
        });
    }

    let resolver = GreedyResolver;
    let mut accepted: Vec<ColumnId> = Vec::new();
    let mut plan = JoinPlan::new(report.origin);

    for column in report.column_ids() {
        let mut attempt = accepted.clone();
        attempt.push(column);
        match resolver.resolve(schema, report.origin, &attempt) {
            Ok(next) => {
                accepted = attempt;
                plan = next;
            }
            Err(PlanError::UnjoinableColumn { column: name, .. }) => {
                errors.push(unjoinable(schema, report, column, name));
            }
            Err(e) => errors.push(ValidationError::UndefinedReference {
                report: report.name.clone(),
                reference: e.to_string(),
            }),
        }
    }

    plan
}

/// Distinguish "reachable through an unrequested table" from "unreachable".
fn unjoinable(schema: &Schema, report: &Report, id: ColumnId, name: String) -> ValidationError {
    let shortest = schema
        .column(id)
        .into_iter()
        .flat_map(|c| c.sources.iter())
        .filter_map(|source| schema.join_path(report.origin, *source))
        .min_by_key(|path| path.len());

    match shortest {
        Some(path) => {
            let mut names = vec![source_name(schema, report.origin)];
            names.extend(path.iter().map(|hop| source_name(schema, hop.to)));
            ValidationError::NeedsIntermediate {
                report: report.name.clone(),
                column: name,
                path: names,
            }
        }
        None => ValidationError::Unreachable {
            report: report.name.clone(),
            column: name,
        },
    }
}

fn validate_filters_qualify(
    schema: &Schema,
    report: &Report,
    plan: &JoinPlan,
    errors: &mut Vec<ValidationError>,
) {
    for filter in report.filters.iter().filter(|f| !f.columns.is_empty()) {
        let qualifies = filter.columns.iter().any(|id| {
            schema
                .column(*id)
                .is_some_and(|c| c.sources.iter().any(|s| plan.contains_source(*s)))
        });
        if !qualifies {
            errors.push(ValidationError::UnqualifiableFilter {
                report: report.name.clone(),
                filter: filter.name.clone(),
            });
        }
    }
}

fn source_name(schema: &Schema, id: SourceId) -> String {
    schema
        .source(id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| id.to_string())
}
