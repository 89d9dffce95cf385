//! Gradient-boosted tree ensemble read from XGBoost's JSON model format

use serde::{Deserialize, Deserializer};

/// Node of a regression tree.
///
/// Children always sit at a larger index than their parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }
}

/// One regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Build a tree, checking that it is well formed for `num_features` inputs.
    pub fn new(nodes: Vec<Node>, num_features: usize) -> Result<Self, String> {
        if nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in nodes.iter().enumerate() {
            if !(node.cover() >= 0.0) {
                return Err(format!("node {idx} has invalid cover {}", node.cover()));
            }
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature >= num_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, model has {num_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Child an instance follows at a split: `(hot, cold)`. `None` at a leaf.
    pub fn route(&self, idx: usize, x: &[f64]) -> Option<(usize, usize)> {
        match self.nodes[idx] {
            Node::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
                ..
            } => Some(split_direction(x[feature], threshold, left, right, default_left)),
            Node::Leaf { .. } => None,
        }
    }

    /// Leaf value reached by `x`. `x` must hold at least every split feature.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value, .. } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                    ..
                } => idx = split_direction(x[feature], threshold, left, right, default_left).0,
            }
        }
    }

    /// Cover-weighted mean leaf value: the tree's output when nothing is known.
    pub fn expected_value(&self) -> f64 {
        self.subtree_mean(0)
    }

    pub(crate) fn subtree_mean(&self, idx: usize) -> f64 {
        match self.nodes[idx] {
            Node::Leaf { value, .. } => value,
            Node::Split { left, right, .. } => {
                let (wl, wr) = self.child_weights(idx);
                wl * self.subtree_mean(left) + wr * self.subtree_mean(right)
            }
        }
    }

    /// Fractions of training cover flowing to the left and right child.
    ///
    /// Normalized by the children's total so the two always sum to one.
    pub fn child_weights(&self, idx: usize) -> (f64, f64) {
        match self.nodes[idx] {
            Node::Split { left, right, .. } => {
                let cl = self.nodes[left].cover();
                let cr = self.nodes[right].cover();
                let total = cl + cr;
                if total > 0.0 {
                    (cl / total, cr / total)
                } else {
                    (0.5, 0.5)
                }
            }
            Node::Leaf { .. } => (0.0, 0.0),
        }
    }
}

/// Comparison happens in single precision, as the trees were grown on f32
/// inputs; NaN follows the learned default direction.
fn split_direction(
    value: f64,
    threshold: f32,
    left: usize,
    right: usize,
    default_left: bool,
) -> (usize, usize) {
    let go_left = if value.is_nan() {
        default_left
    } else {
        (value as f32) < threshold
    };
    if go_left {
        (left, right)
    } else {
        (right, left)
    }
}

/// Binary classifier: a sum of trees on top of a base log-odds margin.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    base_margin: f64,
    num_features: usize,
    feature_names: Vec<String>,
}

impl TreeEnsemble {
    pub fn new(
        trees: Vec<Tree>,
        base_margin: f64,
        num_features: usize,
        feature_names: Vec<String>,
    ) -> Self {
        Self {
            trees,
            base_margin,
            num_features,
            feature_names,
        }
    }

    /// Parse an XGBoost JSON model (`Booster.save_model("model.json")`).
    pub fn from_xgboost_json(bytes: &[u8]) -> Result<Self, String> {
        let doc: XgbModelFile =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid model JSON: {e}"))?;
        let learner = doc.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(format!(
                "unsupported booster '{}', expected gbtree",
                learner.gradient_booster.name
            ));
        }
        if learner.objective.name != "binary:logistic" {
            return Err(format!(
                "unsupported objective '{}', expected binary:logistic",
                learner.objective.name
            ));
        }

        let params = &learner.learner_model_param;
        let num_class: usize = parse_param(&params.num_class, "num_class")?;
        if num_class > 1 {
            return Err(format!("multi-class model with {num_class} classes"));
        }
        let num_features: usize = parse_param(&params.num_feature, "num_feature")?;
        let base_score: f64 = parse_param(&params.base_score, "base_score")?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(format!("base_score {base_score} is not a probability"));
        }
        // Stored as a probability; the trees add to its log-odds
        let base_margin = (base_score / (1.0 - base_score)).ln();

        let gbtree = learner
            .gradient_booster
            .model
            .ok_or_else(|| "gbtree model section is missing".to_string())?;
        let mut raw_trees = gbtree.trees;

        // Early-stopped models score with the trees up to the best round only
        if let Some(best) = &learner.attributes.best_iteration {
            let best_iteration: usize = parse_param(best, "best_iteration")?;
            let per_round: usize = match &gbtree.gbtree_model_param {
                Some(param) => parse_param(&param.num_parallel_tree, "num_parallel_tree")?,
                None => 1,
            };
            let keep = (best_iteration + 1) * per_round.max(1);
            if keep > raw_trees.len() {
                return Err(format!(
                    "best_iteration {best_iteration} needs {keep} trees, model has {}",
                    raw_trees.len()
                ));
            }
            raw_trees.truncate(keep);
        }

        let trees = raw_trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| t.into_tree(num_features).map_err(|e| format!("tree {i}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        if trees.is_empty() {
            return Err("model contains no trees".to_string());
        }

        Ok(Self::new(
            trees,
            base_margin,
            num_features,
            learner.feature_names,
        ))
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn base_margin(&self) -> f64 {
        self.base_margin
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Feature names recorded at training time; empty if none were saved.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Raw log-odds output for one row.
    pub fn predict_margin(&self, x: &[f64]) -> f64 {
        self.base_margin + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    /// Expected margin over the training distribution, as seen through node covers.
    pub fn expected_margin(&self) -> f64 {
        self.base_margin + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }
}

// ---------------------------------------------------------------------------
// On-disk XGBoost JSON layout (only the fields inference needs)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct XgbModelFile {
    learner: XgbLearner,
}

#[derive(Deserialize)]
struct XgbLearner {
    #[serde(default)]
    attributes: XgbAttributes,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: XgbGradientBooster,
    learner_model_param: XgbLearnerParam,
    objective: XgbObjective,
}

/// Training attributes; values are strings. Only early stopping matters here.
#[derive(Deserialize, Default)]
struct XgbAttributes {
    best_iteration: Option<String>,
}

#[derive(Deserialize)]
struct XgbGradientBooster {
    name: String,
    model: Option<XgbGbtreeModel>,
}

#[derive(Deserialize)]
struct XgbGbtreeModel {
    gbtree_model_param: Option<XgbGbtreeParam>,
    trees: Vec<XgbTree>,
}

#[derive(Deserialize)]
struct XgbGbtreeParam {
    #[serde(default = "default_parallel_tree")]
    num_parallel_tree: String,
}

fn default_parallel_tree() -> String {
    "1".to_string()
}

#[derive(Deserialize)]
struct XgbLearnerParam {
    base_score: String,
    #[serde(default = "default_num_class")]
    num_class: String,
    num_feature: String,
}

fn default_num_class() -> String {
    "0".to_string()
}

#[derive(Deserialize)]
struct XgbObjective {
    name: String,
}

#[derive(Deserialize)]
struct XgbTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    #[serde(deserialize_with = "flags")]
    default_left: Vec<bool>,
    sum_hessian: Vec<f64>,
    #[serde(default)]
    split_type: Vec<i64>,
}

impl XgbTree {
    fn into_tree(self, num_features: usize) -> Result<Tree, String> {
        let n = self.left_children.len();
        let lengths = [
            self.right_children.len(),
            self.split_indices.len(),
            self.split_conditions.len(),
            self.default_left.len(),
            self.sum_hessian.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err("node arrays have different lengths".to_string());
        }
        if self.split_type.iter().any(|&t| t != 0) {
            return Err("categorical splits are not supported".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let cover = self.sum_hessian[i];
            let node = if self.left_children[i] < 0 {
                // Leaves keep their (learning-rate scaled) value in split_conditions
                Node::Leaf {
                    value: self.split_conditions[i],
                    cover,
                }
            } else {
                Node::Split {
                    feature: to_index(self.split_indices[i], "split index")?,
                    threshold: self.split_conditions[i] as f32,
                    left: to_index(self.left_children[i], "left child")?,
                    right: to_index(self.right_children[i], "right child")?,
                    default_left: self.default_left[i],
                    cover,
                }
            };
            nodes.push(node);
        }

        Tree::new(nodes, num_features)
    }
}

fn to_index(raw: i64, what: &str) -> Result<usize, String> {
    usize::try_from(raw).map_err(|_| format!("negative {what} {raw}"))
}

/// Numeric params are serialized as strings, newer releases wrap them in brackets.
fn parse_param<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .map_err(|_| format!("cannot parse {name} '{raw}'"))
}

/// `default_left` is written as 0/1 integers by current releases and as
/// booleans by older ones.
fn flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    let raw = Vec::<Flag>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|f| match f {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
        .collect())
}
