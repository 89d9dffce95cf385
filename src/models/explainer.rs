//! Local feature attribution for a single scored row.
//!
//! Exact path-dependent TreeSHAP: for every tree, the contributions of the
//! features along the instance's decision paths are computed in polynomial
//! time, weighting unseen branches by their training cover. Contributions are
//! in log-odds units and satisfy local accuracy:
//! `base_value + sum(contributions) == margin`.

use crate::error::AnalysisError;
use crate::feature_extractor::FeatureRow;
use crate::models::booster::{Node, Tree, TreeEnsemble};
use serde::{Deserialize, Serialize};

/// Signed push of one feature on the model output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    /// Feature value of the explained row
    pub value: f64,
    /// Contribution to the margin (log-odds)
    pub shap_value: f64,
}

/// Baseline plus per-feature contributions for one row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribution {
    /// Expected margin when no feature is known
    pub base_value: f64,
    /// Model margin for the explained row
    pub output_value: f64,
    /// One entry per schema column, in schema order
    pub contributions: Vec<FeatureContribution>,
}

impl Attribution {
    /// Baseline plus every contribution; equals `output_value` up to rounding.
    pub fn reconstructed_output(&self) -> f64 {
        self.base_value + self.contributions.iter().map(|c| c.shap_value).sum::<f64>()
    }

    /// Contributions ordered by decreasing magnitude.
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut ranked: Vec<&FeatureContribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| b.shap_value.abs().total_cmp(&a.shap_value.abs()));
        ranked
    }
}

/// TreeSHAP explainer bound to one ensemble
pub struct TreeExplainer<'a> {
    model: &'a TreeEnsemble,
    expected_value: f64,
}

impl<'a> TreeExplainer<'a> {
    pub fn new(model: &'a TreeEnsemble) -> Self {
        Self {
            model,
            expected_value: model.expected_margin(),
        }
    }

    /// Baseline the contributions start from.
    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    /// Explain one row.
    pub fn explain(&self, row: &FeatureRow) -> Result<Attribution, AnalysisError> {
        let x = row.values();
        if x.len() != self.model.num_features() {
            return Err(AnalysisError::Scoring(format!(
                "cannot explain a row of {} features, model expects {}",
                x.len(),
                self.model.num_features()
            )));
        }

        let mut phi = vec![0.0; x.len()];
        for tree in self.model.trees() {
            tree_shap(tree, x, &mut phi);
        }

        let contributions = row
            .iter()
            .zip(phi)
            .map(|((name, value), shap_value)| FeatureContribution {
                name: name.to_string(),
                value,
                shap_value,
            })
            .collect();

        Ok(Attribution {
            base_value: self.expected_value,
            output_value: self.model.predict_margin(x),
            contributions,
        })
    }
}

/// One feature on the current root-to-node path.
///
/// `zero_fraction` is the share of cover that reaches this point when the
/// feature is unknown, `one_fraction` is 1 when the instance itself goes this
/// way and 0 otherwise. `weight` accumulates the permutation weights for
/// subsets of a given size.
#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// Add the contributions of one tree to `phi`.
fn tree_shap(tree: &Tree, x: &[f64], phi: &mut [f64]) {
    recurse(tree, 0, x, phi, &[], 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    idx: usize,
    x: &[f64],
    phi: &mut [f64],
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = Vec::with_capacity(parent_path.len() + 1);
    path.extend_from_slice(parent_path);
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    let split_feature = match *tree.node(idx) {
        Node::Leaf { value, .. } => {
            for i in 1..path.len() {
                let weight = unwound_path_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    phi[f] += weight * (el.one_fraction - el.zero_fraction) * value;
                }
            }
            return;
        }
        Node::Split { feature, .. } => feature,
    };

    let Some((hot, cold)) = tree.route(idx, x) else {
        return;
    };
    let (w_left, w_right) = tree.child_weights(idx);
    let (hot_zero, cold_zero) = match *tree.node(idx) {
        Node::Split { left, .. } if hot == left => (w_left, w_right),
        _ => (w_right, w_left),
    };

    // A feature seen earlier on the path is folded back into a single element
    let mut incoming_zero = 1.0;
    let mut incoming_one = 1.0;
    if let Some(pos) = path.iter().position(|el| el.feature == Some(split_feature)) {
        incoming_zero = path[pos].zero_fraction;
        incoming_one = path[pos].one_fraction;
        unwind_path(&mut path, pos);
    }

    recurse(
        tree,
        hot,
        x,
        phi,
        &path,
        hot_zero * incoming_zero,
        incoming_one,
        Some(split_feature),
    );
    recurse(
        tree,
        cold,
        x,
        phi,
        &path,
        cold_zero * incoming_zero,
        0.0,
        Some(split_feature),
    );
}

fn extend_path(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

/// Remove element `pos` from the path, undoing its effect on the weights.
fn unwind_path(path: &mut Vec<PathElement>, pos: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[pos].one_fraction;
    let zero_fraction = path[pos].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            next_one_portion =
                tmp - path[i].weight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    // Only the feature data shifts; the recomputed weights stay in place
    for i in pos..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total weight the path would carry with element `pos` removed.
fn unwound_path_sum(path: &[PathElement], pos: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[pos].one_fraction;
    let zero_fraction = path[pos].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero_fraction * (depth - i) as f64 / denom;
        } else if zero_fraction != 0.0 {
            total += path[i].weight / zero_fraction / ((depth - i) as f64 / denom);
        }
    }

    total
}
