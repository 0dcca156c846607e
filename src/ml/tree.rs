// ============================================================
// Layer 5 - CART Decision Tree
// ============================================================
// A binary classification tree grown greedily on Gini impurity.
//
// Growth stops at a node when any of these holds:
//   - the node is pure
//   - the node's depth equals `max_depth`
//   - fewer than `min_samples_split` samples reach it
//   - no sampled feature offers a split that lowers impurity
//
// At every split only `max_features` features, drawn without
// replacement, are considered. Thresholds sit halfway between
// two consecutive distinct values; `x <= threshold` goes left.
//
// Nodes live in one flat Vec and refer to children by index.
//
// Reference: Breiman et al. (1984) Classification and Regression Trees
//            Rust Book §8 (Vectors)

use ndarray::{ArrayView1, ArrayView2};
use rand::{rngs::StdRng, seq::index::sample};

/// Growth limits for one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub max_features: usize,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Class fractions of the training samples in this leaf
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted classification tree over class indices `0..n_classes`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Builder<'a, 'r> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    rng: &'r mut StdRng,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (repeats allowed,
    /// which is how bootstrap weights reach the tree).
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        samples: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            x: x.view(),
            y,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(samples, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Class distribution of the leaf `row` falls into
    pub fn predict_proba(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Builder<'_, '_> {
    // Returns the index of the node created for `samples`
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let impurity = gini(&counts, samples.len());

        let can_split = depth < self.params.max_depth
            && samples.len() >= self.params.min_samples_split
            && impurity > 0.0;

        if can_split {
            if let Some(best) = self.best_split(&samples, impurity) {
                let (left, right): (Vec<usize>, Vec<usize>) = samples
                    .into_iter()
                    .partition(|&i| self.x[[i, best.feature]] <= best.threshold);

                // Reserve this node's slot before the children are pushed
                let at = self.nodes.len();
                self.nodes.push(Node::Leaf {
                    distribution: Vec::new(),
                });
                let left = self.grow(left, depth + 1);
                let right = self.grow(right, depth + 1);
                self.nodes[at] = Node::Split {
                    feature: best.feature,
                    threshold: best.threshold,
                    left,
                    right,
                };
                return at;
            }
        }

        let total = samples.len().max(1) as f64;
        let distribution = counts.iter().map(|&c| c as f64 / total).collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn best_split(&mut self, samples: &[usize], parent_impurity: f64) -> Option<BestSplit> {
        let n_features = self.x.ncols();
        let k = self.params.max_features.min(n_features);
        let candidates = sample(&mut *self.rng, n_features, k);

        let n = samples.len();
        let mut best: Option<BestSplit> = None;
        let mut order: Vec<usize> = samples.to_vec();

        for feature in candidates.iter() {
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left = vec![0usize; self.n_classes];
            let mut right = self.class_counts(&order);

            for pos in 0..n - 1 {
                let i = order[pos];
                left[self.y[i]] += 1;
                right[self.y[i]] -= 1;

                let here = self.x[[i, feature]];
                let next = self.x[[order[pos + 1], feature]];
                if here == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                let better = best.as_ref().map_or(true, |b| weighted < b.impurity);
                if weighted < parent_impurity && better {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        impurity: weighted,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
