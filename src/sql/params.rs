//! Positional parameter collection.
//!
//! Values never appear in SQL text. Each bound value is pushed here while the
//! statement is tokenized and replaced by a 1-based placeholder token, so the
//! n-th placeholder in the output always refers to `values[n - 1]`.

use serde_json::Value;

use super::token::Token;

/// Ordered list of bound parameter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Vec<Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return the placeholder token that refers to it.
    pub fn push(&mut self, value: Value) -> Token {
        self.values.push(value);
        Token::Placeholder(self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
