use super::check_features;
use crate::error::ScoringError;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `features[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probability: f64,
    },
}

/// Flat decision tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let mut index = 0;
        // a well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ScoringError::MalformedModel(format!("split on missing feature {feature}"))
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ScoringError::MalformedModel(format!(
                        "node {index} does not exist"
                    )))
                }
            }
        }
        Err(ScoringError::MalformedModel("tree contains a cycle".to_string()))
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }
}

/// Averaged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Length of the feature vector the trees were trained on
    pub input_dimension: usize,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        check_features(features, self.input_dimension)?;
        if self.trees.is_empty() {
            return Err(ScoringError::MalformedModel("ensemble has no trees".to_string()));
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {i} has no nodes"));
            }
            if tree.max_feature().is_some_and(|f| f >= self.input_dimension) {
                return Err(format!("tree {i} splits on a feature beyond the input dimension"));
            }
        }
        Ok(())
    }
}
