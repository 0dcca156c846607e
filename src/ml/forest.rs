// ============================================================
// Layer 5 - Random Forest Classifier
// ============================================================
// An ensemble of CART trees (see tree.rs), each grown on a
// bootstrap sample of the training rows.
//
//   fit      validate hyperparameters, map labels to class
//            indices, grow `n_estimators` trees
//   predict  average the leaf class distributions of all trees
//            and pick the most probable class (ties go to the
//            smaller label)
//
// All randomness comes from one StdRng seeded with
// `random_state`, so two forests with the same settings fitted
// on the same rows are identical. Cross-validation relies on
// this: every fold builds a fresh forest from the same params.
//
// Hyperparameter checks happen in `fit`, where the number of
// features is known:
//   max_depth     >= 1
//   max_features  in 1..=n_features
//   n_estimators  >= 1
//
// Reference: Breiman (2001) Random Forests
//            rand crate documentation

use ndarray::ArrayView2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, RunError};
use crate::domain::traits::Classifier;
use crate::ml::tree::{DecisionTree, TreeParams};

/// Settings of a forest. Depth and feature count are kept signed
/// because they arrive unchecked from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: i64,
    pub max_features: i64,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 5,
            max_features: 3,
            random_state: 42,
        }
    }
}

impl ForestParams {
    fn tree_params(&self, n_features: usize) -> Result<TreeParams> {
        if self.n_estimators == 0 {
            return Err(RunError::InvalidHyperparameter {
                name: "n_estimators",
                value: 0,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_depth < 1 {
            return Err(RunError::InvalidHyperparameter {
                name: "max_depth",
                value: self.max_depth,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_features < 1 || self.max_features as u64 > n_features as u64 {
            return Err(RunError::InvalidHyperparameter {
                name: "max_features",
                value: self.max_features,
                reason: format!("must be between 1 and the {n_features} available features"),
            });
        }

        Ok(TreeParams {
            max_depth: usize::try_from(self.max_depth).unwrap_or(usize::MAX),
            max_features: self.max_features as usize,
            min_samples_split: 2,
        })
    }
}

/// Bootstrap-aggregated CART trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    /// Sorted distinct training labels; tree class `i` is `classes[i]`
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            trees: Vec::new(),
        }
    }

    /// Labels seen during `fit`, ascending
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[i64]) -> Result<()> {
        if features.nrows() != labels.len() {
            return Err(RunError::LengthMismatch {
                expected: features.nrows(),
                actual: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(RunError::insufficient_folds("cannot fit a forest on zero rows"));
        }
        let tree_params = self.params.tree_params(features.ncols())?;

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let y: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect();

        let n = labels.len();
        let mut rng = StdRng::seed_from_u64(self.params.random_state);
        let trees = (0..self.params.n_estimators)
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let bootstrap: Vec<usize> = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();
                DecisionTree::fit(features, &y, classes.len(), bootstrap, tree_params, &mut tree_rng)
            })
            .collect();

        tracing::trace!(
            "Forest fitted: {} trees on {} rows x {} features, {} classes",
            self.params.n_estimators,
            n,
            features.ncols(),
            classes.len()
        );

        self.classes = classes;
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>> {
        if self.trees.is_empty() {
            return Err(RunError::InvalidHyperparameter {
                name: "n_estimators",
                value: 0,
                reason: "predict called before fit".to_string(),
            });
        }

        let predictions = features
            .rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0.0f64; self.classes.len()];
                for tree in &self.trees {
                    for (v, p) in votes.iter_mut().zip(tree.predict_proba(row)) {
                        *v += p;
                    }
                }
                // First maximum wins, i.e. the smallest label on ties
                let mut best = 0;
                for (i, &v) in votes.iter().enumerate() {
                    if v > votes[best] {
                        best = i;
                    }
                }
                self.classes[best]
            })
            .collect();

        Ok(predictions)
    }
}
