//! Single-row inference engine for fraud detection

use crate::error::AnalysisError;
use crate::feature_extractor::FeatureRow;
use crate::models::booster::TreeEnsemble;
use crate::types::prediction::Prediction;
use tracing::debug;

/// Scores one model-ready row with the boosted tree classifier
pub struct InferenceEngine<'a> {
    model: &'a TreeEnsemble,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(model: &'a TreeEnsemble) -> Self {
        Self { model }
    }

    /// Number of features the model consumes
    pub fn feature_count(&self) -> usize {
        self.model.num_features()
    }

    /// Run predict and predict-probability on a single row.
    ///
    /// A row of the wrong width or with non-finite values is rejected; there
    /// is no fallback score.
    pub fn predict(&self, row: &FeatureRow) -> Result<Prediction, AnalysisError> {
        if row.len() != self.model.num_features() {
            return Err(AnalysisError::Scoring(format!(
                "feature row has {} values, model expects {}",
                row.len(),
                self.model.num_features()
            )));
        }

        if let Some((column, value)) = row.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::Scoring(format!(
                "feature '{column}' has non-finite value {value}"
            )));
        }

        let margin = self.model.predict_margin(row.values());
        if !margin.is_finite() {
            return Err(AnalysisError::Scoring(format!(
                "model produced non-finite margin {margin}"
            )));
        }

        let prediction = Prediction::from_margin(margin);

        debug!(
            margin = margin,
            fraud_probability = prediction.probabilities[1],
            label = ?prediction.label,
            "Row scored"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booster::{Node, Tree};
    use crate::types::prediction::FraudLabel;

    fn model() -> TreeEnsemble {
        let tree = Tree::new(
            vec![
                Node::Split {
                    feature: 1,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                    default_left: false,
                    cover: 10.0,
                },
                Node::Leaf {
                    value: -2.0,
                    cover: 9.0,
                },
                Node::Leaf {
                    value: 3.0,
                    cover: 1.0,
                },
            ],
            2,
        )
        .unwrap();
        TreeEnsemble::new(vec![tree], 0.5, 2, Vec::new())
    }

    fn row(values: Vec<f64>) -> FeatureRow {
        let columns = vec!["amount".to_string(), "type_TRANSFER".to_string()];
        FeatureRow::new(columns, values).unwrap()
    }

    #[test]
    fn test_predict_both_classes() {
        let model = model();
        let engine = InferenceEngine::new(&model);

        let fraud = engine.predict(&row(vec![100.0, 1.0])).unwrap();
        assert_eq!(fraud.label, FraudLabel::Fraudulent);
        assert!((fraud.margin - 3.5).abs() < 1e-12);

        let legit = engine.predict(&row(vec![100.0, 0.0])).unwrap();
        assert_eq!(legit.label, FraudLabel::Legitimate);
        assert!((legit.margin + 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_malformed_rows() {
        let model = model();
        let engine = InferenceEngine::new(&model);

        let narrow = FeatureRow::new(vec!["amount".to_string()], vec![1.0]).unwrap();
        assert!(matches!(engine.predict(&narrow), Err(AnalysisError::Scoring(_))));

        let nan = row(vec![f64::NAN, 1.0]);
        let err = engine.predict(&nan).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }
}
