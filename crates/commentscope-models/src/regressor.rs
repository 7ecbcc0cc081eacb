//! Gradient-boosted tree regressor loaded from XGBoost's JSON model format
//!
//! Models are exported from XGBoost with `booster.save_model("model.json")`
//! (or `XGBRegressor.save_model`). Only the `gbtree` booster with numerical
//! splits is supported; evaluation walks each tree from the root:
//!
//! - missing (NaN) feature: follow `default_left`
//! - `x < split_condition`: go left, otherwise right
//! - leaves carry their weight in `split_conditions`
//!
//! The per-group tree sums are added to the base margin and passed through
//! the objective's link function.

use crate::inference::{RawPrediction, Regressor};
use commentscope_core::{Error, Result};
use serde::Deserialize;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct XgbDocument {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveSpec,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    trees: Vec<RawTree>,
    #[serde(default)]
    tree_info: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveSpec {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// Older XGBoost releases write booleans, newer ones write 0/1
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Link {
    Identity,
    Log,
    Softmax,
}

impl Link {
    fn for_objective(name: &str) -> Result<Self> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:pseudohubererror" | "reg:absoluteerror"
            | "reg:quantileerror" => Ok(Self::Identity),
            "count:poisson" | "reg:gamma" | "reg:tweedie" => Ok(Self::Log),
            "multi:softmax" | "multi:softprob" => Ok(Self::Softmax),
            other => Err(Error::model(format!(
                "Unsupported XGBoost objective '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    condition: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left < 0
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(raw: RawTree, tree_idx: usize) -> Result<Self> {
        let n = raw.left_children.len();
        if raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
            || raw.default_left.len() != n
        {
            return Err(Error::model(format!(
                "Tree {} has inconsistent node arrays",
                tree_idx
            )));
        }
        if n == 0 {
            return Err(Error::model(format!("Tree {} has no nodes", tree_idx)));
        }
        if raw.split_type.iter().any(|&t| t != 0) {
            return Err(Error::model(format!(
                "Tree {} uses categorical splits, which are not supported",
                tree_idx
            )));
        }

        let mut nodes = Vec::with_capacity(n);
        for idx in 0..n {
            let left = raw.left_children[idx];
            let right = raw.right_children[idx];

            // Children are always allocated after their parent; checking this
            // also guarantees traversal terminates.
            if left >= 0 {
                let valid = |child: i32| child as usize > idx && (child as usize) < n;
                if !valid(left) || !valid(right) {
                    return Err(Error::model(format!(
                        "Tree {} node {} has invalid children ({}, {})",
                        tree_idx, idx, left, right
                    )));
                }
            }

            nodes.push(Node {
                left,
                right,
                feature: raw.split_indices[idx] as usize,
                condition: raw.split_conditions[idx],
                default_left: raw.default_left[idx].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|node| !node.is_leaf())
            .map(|node| node.feature)
            .max()
    }

    fn leaf_value(&self, row: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.condition;
            }

            let value = row[node.feature];
            let go_left = if value.is_nan() {
                node.default_left
            } else {
                value < node.condition
            };
            let next = if go_left { node.left } else { node.right };
            idx = next as usize;
        }
    }
}

/// XGBoost `gbtree` model evaluated in-process
#[derive(Debug, Clone)]
pub struct XgbRegressor {
    objective: String,
    link: Link,
    base_margin: f64,
    num_groups: usize,
    num_feature: usize,
    trees: Vec<Tree>,
    tree_groups: Vec<usize>,
}

impl XgbRegressor {
    /// Load a model saved with `save_model("*.json")`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::model(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let document: XgbDocument = serde_json::from_reader(reader)
            .map_err(|e| Error::model(format!("Failed to parse XGBoost model: {}", e)))?;
        Self::from_document(document)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: XgbDocument = serde_json::from_str(json)
            .map_err(|e| Error::model(format!("Failed to parse XGBoost model: {}", e)))?;
        Self::from_document(document)
    }

    fn from_document(document: XgbDocument) -> Result<Self> {
        let learner = document.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(Error::model(format!(
                "Unsupported booster '{}' (only gbtree is supported)",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| Error::model("gbtree booster has no model section"))?;

        let objective = learner.objective.name;
        let link = Link::for_objective(&objective)?;

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let base_margin = match link {
            Link::Log => {
                if base_score <= 0.0 {
                    return Err(Error::model(format!(
                        "base_score {} is invalid for log-link objective '{}'",
                        base_score, objective
                    )));
                }
                base_score.ln()
            }
            Link::Identity | Link::Softmax => base_score,
        };

        let num_class = parse_param(learner.learner_model_param.num_class.as_deref())?.unwrap_or(0);
        let num_groups = match link {
            Link::Softmax => num_class.max(1),
            _ => 1,
        };

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| Tree::from_raw(raw, idx))
            .collect::<Result<Vec<_>>>()?;

        let tree_groups = if model.tree_info.is_empty() {
            vec![0; trees.len()]
        } else if model.tree_info.len() == trees.len() {
            model.tree_info
        } else {
            return Err(Error::model(format!(
                "tree_info has {} entries for {} trees",
                model.tree_info.len(),
                trees.len()
            )));
        };
        if let Some(&group) = tree_groups.iter().find(|&&g| g >= num_groups) {
            return Err(Error::model(format!(
                "Tree assigned to output group {} but model has {} groups",
                group, num_groups
            )));
        }

        let required_features = trees
            .iter()
            .filter_map(Tree::max_feature)
            .max()
            .map(|f| f + 1)
            .unwrap_or(0);
        let num_feature = parse_param(learner.learner_model_param.num_feature.as_deref())?
            .unwrap_or(required_features);
        if required_features > num_feature {
            return Err(Error::model(format!(
                "Trees reference feature {} but model declares {} features",
                required_features - 1,
                num_feature
            )));
        }

        tracing::debug!(
            objective = %objective,
            trees = trees.len(),
            num_feature,
            base_score,
            "Parsed XGBoost model"
        );

        Ok(Self {
            objective,
            link,
            base_margin,
            num_groups,
            num_feature,
            trees,
            tree_groups,
        })
    }

    /// Number of input features the model expects
    pub fn num_feature(&self) -> usize {
        self.num_feature
    }

    /// Number of boosted trees
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Training objective name
    pub fn objective(&self) -> &str {
        &self.objective
    }

    fn predict_row(&self, row: &[f32]) -> Result<RawPrediction> {
        if row.len() != self.num_feature {
            return Err(Error::inference(format!(
                "Feature shape mismatch, expected: {}, got {}",
                self.num_feature,
                row.len()
            )));
        }

        let mut margins = vec![self.base_margin; self.num_groups];
        for (tree, &group) in self.trees.iter().zip(&self.tree_groups) {
            margins[group] += tree.leaf_value(row) as f64;
        }

        let prediction = match self.link {
            Link::Identity => RawPrediction::Value(margins[0]),
            Link::Log => RawPrediction::Value(margins[0].exp()),
            Link::Softmax => {
                let best = margins
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                RawPrediction::Class(best as i64)
            }
        };
        Ok(prediction)
    }
}

impl Regressor for XgbRegressor {
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<RawPrediction>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    fn descriptor(&self) -> String {
        format!("xgboost.gbtree({}, {} trees)", self.objective, self.trees.len())
    }
}

/// `base_score` is written as `"5E-1"`, or `"[5E-1]"` since XGBoost 2.1
fn parse_base_score(raw: &str) -> Result<f64> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or("").trim();
    first
        .parse::<f64>()
        .map_err(|_| Error::model(format!("Invalid base_score '{}'", raw)))
}

fn parse_param(raw: Option<&str>) -> Result<Option<usize>> {
    raw.map(|value| {
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::model(format!("Invalid model parameter '{}'", value)))
    })
    .transpose()
}
