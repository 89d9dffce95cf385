//! Classification result of a scored transaction

use serde::{Deserialize, Serialize};

/// Binary class produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FraudLabel {
    Legitimate,
    Fraudulent,
}

impl FraudLabel {
    /// Class index as used at training time (0 = legitimate, 1 = fraud).
    pub fn class_index(&self) -> usize {
        match self {
            FraudLabel::Legitimate => 0,
            FraudLabel::Fraudulent => 1,
        }
    }
}

/// Label plus the two-class probability distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: FraudLabel,

    /// `[P(legitimate), P(fraudulent)]`
    pub probabilities: [f64; 2],

    /// Raw log-odds output of the ensemble
    pub margin: f64,
}

impl Prediction {
    /// Build a prediction from the ensemble's raw log-odds output.
    ///
    /// The label is fraud when P(fraud) > 0.5, the boosted classifier's rule.
    pub fn from_margin(margin: f64) -> Self {
        let fraud = sigmoid(margin);
        let label = if fraud > 0.5 {
            FraudLabel::Fraudulent
        } else {
            FraudLabel::Legitimate
        };

        Self {
            label,
            probabilities: [1.0 - fraud, fraud],
            margin,
        }
    }

    pub fn is_fraud(&self) -> bool {
        self.label == FraudLabel::Fraudulent
    }

    /// Probability of the winning class.
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.label.class_index()]
    }

    /// Banner text: the verdict and the winning class probability as a percentage.
    pub fn headline(&self) -> String {
        let verdict = match self.label {
            FraudLabel::Fraudulent => "FRAUD",
            FraudLabel::Legitimate => "Not fraud",
        };
        format!(
            "Prediction: {} (Probability: {:.2}%)",
            verdict,
            self.confidence() * 100.0
        )
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
