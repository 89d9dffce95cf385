//! Feature engineering for transaction fraud model inference.
//!
//! Reproduces the preprocessing done before training: one-hot encoding of the
//! transaction type, the two balance error terms, and column selection in the
//! order persisted with the model.

use crate::error::AnalysisError;
use crate::models::schema::FeatureSchema;
use crate::types::transaction::{RawTransaction, TransactionType};

/// One model-ready row: column names and values in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    /// Build a row from parallel name/value lists of equal length.
    pub fn new(columns: Vec<String>, values: Vec<f64>) -> Result<Self, String> {
        if columns.len() != values.len() {
            return Err(format!(
                "{} column names for {} values",
                columns.len(),
                values.len()
            ));
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a feature value by column name.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// Iterate `(column, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Feature extractor that transforms raw transactions into model input rows.
///
/// Stateless; identical input always yields an identical row.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Every column the transform knows how to produce, with its value.
    ///
    /// `type_CASH_OUT` is offered for schemas that did not drop the reference
    /// category; the default training schema never selects it.
    pub fn candidate_features(&self, tx: &RawTransaction) -> Vec<(&'static str, f64)> {
        let is_transfer = match tx.tx_type {
            TransactionType::Transfer => 1.0,
            TransactionType::CashOut => 0.0,
        };

        // Residual balance errors: zero when the ledger is consistent
        let error_balance_orig = tx.new_balance_orig + tx.amount - tx.old_balance_orig;
        let error_balance_dest = tx.old_balance_dest + tx.amount - tx.new_balance_dest;

        vec![
            ("step", f64::from(tx.step)),
            ("amount", tx.amount),
            ("oldbalanceOrg", tx.old_balance_orig),
            ("newbalanceOrig", tx.new_balance_orig),
            ("oldbalanceDest", tx.old_balance_dest),
            ("newbalanceDest", tx.new_balance_dest),
            ("type_TRANSFER", is_transfer),
            ("type_CASH_OUT", 1.0 - is_transfer),
            ("errorBalanceOrg", error_balance_orig),
            ("errorBalanceDest", error_balance_dest),
        ]
    }

    /// Extract the row the model expects.
    ///
    /// Columns are selected and ordered by `schema`; any schema column the
    /// transform cannot produce fails the whole extraction.
    pub fn extract(
        &self,
        tx: &RawTransaction,
        schema: &FeatureSchema,
    ) -> Result<FeatureRow, AnalysisError> {
        let candidates = self.candidate_features(tx);

        let mut values = Vec::with_capacity(schema.len());
        let mut missing = Vec::new();

        for column in schema.columns() {
            match candidates.iter().find(|(name, _)| *name == column.as_str()) {
                Some((_, value)) => values.push(*value),
                None => missing.push(column.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(AnalysisError::SchemaMismatch { missing });
        }

        Ok(FeatureRow {
            columns: schema.columns().to_vec(),
            values,
        })
    }

    /// Names of all producible columns.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.candidate_features(&RawTransaction::default())
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
