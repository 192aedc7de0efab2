//! Per-item outcomes for batch operations.

use serde::{Deserialize, Serialize};

/// Result of one item in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchOutcome<T> {
    /// The item succeeded.
    Ok(T),
    /// The item failed; the message is meant for the caller.
    Failed(String),
}

/// One item of a batch, keyed by what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem<T> {
    /// Identifies the request this item answers.
    pub key: String,
    /// What happened.
    pub outcome: BatchOutcome<T>,
}

impl<T> BatchItem<T> {
    /// Creates a successful item.
    pub fn ok(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            outcome: BatchOutcome::Ok(value),
        }
    }

    /// Creates a failed item.
    pub fn failed(key: impl Into<String>, message: impl ToString) -> Self {
        Self {
            key: key.into(),
            outcome: BatchOutcome::Failed(message.to_string()),
        }
    }

    /// Returns true if the item succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Ok(_))
    }

    /// Returns the success value, if any.
    pub fn value(&self) -> Option<&T> {
        match &self.outcome {
            BatchOutcome::Ok(v) => Some(v),
            BatchOutcome::Failed(_) => None,
        }
    }

    /// Returns the failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            BatchOutcome::Ok(_) => None,
            BatchOutcome::Failed(msg) => Some(msg),
        }
    }
}

/// Ordered outcomes of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch<T> {
    /// Items in request order.
    pub items: Vec<BatchItem<T>>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Batch<T> {
    /// Appends an item.
    pub fn push(&mut self, item: BatchItem<T>) {
        self.items.push(item);
    }

    /// Number of items that succeeded.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the batch has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
