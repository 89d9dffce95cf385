//! Raw transaction record as entered on the dashboard form

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction types the classifier was trained on.
///
/// CASH_OUT is the reference category of the one-hot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    #[default]
    Transfer,
    CashOut,
}

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [TransactionType::Transfer, TransactionType::CashOut];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "TRANSFER",
            TransactionType::CashOut => "CASH_OUT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents one synthetic transaction submitted for analysis.
///
/// Field names on the wire match the training data columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Time index (hours since simulation start)
    pub step: u32,

    /// Transaction type
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Transferred amount
    pub amount: f64,

    /// Sender balance before the transaction
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_orig: f64,

    /// Sender balance after the transaction
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: f64,

    /// Receiver balance before the transaction
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: f64,

    /// Receiver balance after the transaction
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: f64,
}

impl RawTransaction {
    /// Check the lower bounds the input form declares.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.step < 1 {
            return Err(AnalysisError::InvalidInput(
                "step must be at least 1".to_string(),
            ));
        }

        let amounts = [
            ("amount", self.amount),
            ("oldbalanceOrg", self.old_balance_orig),
            ("newbalanceOrig", self.new_balance_orig),
            ("oldbalanceDest", self.old_balance_dest),
            ("newbalanceDest", self.new_balance_dest),
        ];
        for (name, value) in amounts {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidInput(format!(
                    "{name} must be a finite number"
                )));
            }
            if value < 0.0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "{name} must not be negative"
                )));
            }
        }

        Ok(())
    }
}

impl Default for RawTransaction {
    /// A fully drained account transferred to a mule: the form's initial values.
    fn default() -> Self {
        Self {
            step: 10,
            tx_type: TransactionType::Transfer,
            amount: 5_000_000.0,
            old_balance_orig: 5_000_000.0,
            new_balance_orig: 0.0,
            old_balance_dest: 10_000.0,
            new_balance_dest: 5_010_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_deserializes_training_names() {
        let json = r#"{
            "step": 1,
            "type": "CASH_OUT",
            "amount": 181.0,
            "oldbalanceOrg": 181.0,
            "newbalanceOrig": 0.0,
            "oldbalanceDest": 21182.0,
            "newbalanceDest": 0.0
        }"#;

        let tx: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.tx_type, TransactionType::CashOut);
        assert_eq!(tx.old_balance_orig, 181.0);
        assert_eq!(tx.old_balance_dest, 21182.0);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"step":1,"type":"PAYMENT","amount":1.0,"oldbalanceOrg":0.0,
            "newbalanceOrig":0.0,"oldbalanceDest":0.0,"newbalanceDest":0.0}"#;
        assert!(serde_json::from_str::<RawTransaction>(json).is_err());
    }

    #[test]
    fn test_default_is_valid() {
        assert!(RawTransaction::default().validate().is_ok());
    }

    #[test]
    fn test_validation_bounds() {
        let tx = RawTransaction {
            step: 0,
            ..RawTransaction::default()
        };
        assert!(matches!(tx.validate(), Err(AnalysisError::InvalidInput(_))));

        let tx = RawTransaction {
            new_balance_dest: -1.0,
            ..RawTransaction::default()
        };
        let err = tx.validate().unwrap_err();
        assert!(err.to_string().contains("newbalanceDest"));

        let tx = RawTransaction {
            amount: f64::INFINITY,
            ..RawTransaction::default()
        };
        assert!(tx.validate().is_err());
    }
}
