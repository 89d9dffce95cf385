//! Analysis form fields as submitted, before they are typed

use crate::error::AnalysisError;
use crate::types::transaction::{RawTransaction, TransactionType};
use serde::Deserialize;
use std::str::FromStr;

/// URL-encoded form body. Every field is kept as text so a bad value can
/// still be echoed back next to the others.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    pub step: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub amount: Option<String>,
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_orig: Option<String>,
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: Option<String>,
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: Option<String>,
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: Option<String>,
}

impl TransactionForm {
    /// Typed transaction, or `InvalidInput` naming the first bad field.
    ///
    /// Range checks are left to [`RawTransaction::validate`].
    pub fn parse(&self) -> Result<RawTransaction, AnalysisError> {
        Ok(RawTransaction {
            step: number(&self.step, "step")?,
            tx_type: transaction_type(&self.tx_type)?,
            amount: number(&self.amount, "amount")?,
            old_balance_orig: number(&self.old_balance_orig, "oldbalanceOrg")?,
            new_balance_orig: number(&self.new_balance_orig, "newbalanceOrig")?,
            old_balance_dest: number(&self.old_balance_dest, "oldbalanceDest")?,
            new_balance_dest: number(&self.new_balance_dest, "newbalanceDest")?,
        })
    }

    /// Values to refill the form with: fields that parse keep what the user
    /// sent, the rest fall back to the defaults.
    pub fn prefill(&self) -> RawTransaction {
        let defaults = RawTransaction::default();
        RawTransaction {
            step: number(&self.step, "step").unwrap_or(defaults.step),
            tx_type: transaction_type(&self.tx_type).unwrap_or(defaults.tx_type),
            amount: number(&self.amount, "amount").unwrap_or(defaults.amount),
            old_balance_orig: number(&self.old_balance_orig, "oldbalanceOrg")
                .unwrap_or(defaults.old_balance_orig),
            new_balance_orig: number(&self.new_balance_orig, "newbalanceOrig")
                .unwrap_or(defaults.new_balance_orig),
            old_balance_dest: number(&self.old_balance_dest, "oldbalanceDest")
                .unwrap_or(defaults.old_balance_dest),
            new_balance_dest: number(&self.new_balance_dest, "newbalanceDest")
                .unwrap_or(defaults.new_balance_dest),
        }
    }
}

fn required<'a>(raw: &'a Option<String>, name: &str) -> Result<&'a str, AnalysisError> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AnalysisError::InvalidInput(format!("{name} is required")))
}

fn number<T: FromStr>(raw: &Option<String>, name: &str) -> Result<T, AnalysisError> {
    let text = required(raw, name)?;
    text.parse().map_err(|_| {
        AnalysisError::InvalidInput(format!("{name} must be a number, got '{text}'"))
    })
}

fn transaction_type(raw: &Option<String>) -> Result<TransactionType, AnalysisError> {
    let text = required(raw, "type")?;
    TransactionType::ALL
        .into_iter()
        .find(|t| t.as_str() == text)
        .ok_or_else(|| {
            AnalysisError::InvalidInput(format!("unknown transaction type '{text}'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TransactionForm {
        TransactionForm {
            step: Some("3".to_string()),
            tx_type: Some("CASH_OUT".to_string()),
            amount: Some("181.5".to_string()),
            old_balance_orig: Some("181.5".to_string()),
            new_balance_orig: Some("0".to_string()),
            old_balance_dest: Some(" 21182 ".to_string()),
            new_balance_dest: Some("0".to_string()),
        }
    }

    #[test]
    fn test_parse_complete_form() {
        let tx = filled().parse().unwrap();
        assert_eq!(tx.step, 3);
        assert_eq!(tx.tx_type, TransactionType::CashOut);
        assert_eq!(tx.amount, 181.5);
        assert_eq!(tx.old_balance_dest, 21182.0);
    }

    #[test]
    fn test_bad_field_is_named() {
        let form = TransactionForm {
            amount: Some("lots".to_string()),
            ..filled()
        };
        let err = form.parse().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert!(err.to_string().contains("amount must be a number, got 'lots'"));

        let form = TransactionForm {
            tx_type: Some("PAYMENT".to_string()),
            ..filled()
        };
        assert!(form.parse().unwrap_err().to_string().contains("'PAYMENT'"));

        let form = TransactionForm {
            step: None,
            ..filled()
        };
        assert!(form.parse().unwrap_err().to_string().contains("step is required"));
    }

    #[test]
    fn test_prefill_keeps_good_fields() {
        let form = TransactionForm {
            tx_type: Some("PAYMENT".to_string()),
            amount: Some("lots".to_string()),
            ..filled()
        };
        let prefill = form.prefill();

        assert_eq!(prefill.step, 3);
        assert_eq!(prefill.old_balance_orig, 181.5);
        assert_eq!(prefill.tx_type, TransactionType::Transfer);
        assert_eq!(prefill.amount, RawTransaction::default().amount);
    }
}
