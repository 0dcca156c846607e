// ============================================================
// Layer 4 - Cross-Validation Fold Splitter
// ============================================================
// Assigns every record to exactly one of `k` test folds.
// No shuffling: the same labels and `k` always give the same
// assignment.
//
// Stratified (default)
//   Classes are numbered in order of first appearance. The
//   sorted class sequence is dealt round-robin into the k
//   folds, which fixes how many rows of each class a fold
//   gets. Each class's rows then take their fold ids in row
//   order. Fold class ratios therefore track the full data.
//
//   Example, k = 3, labels [1,1,0,0,1,0]:
//     class 1 rows 0,1,4 -> folds 0,1,2
//     class 0 rows 2,3,5 -> folds 0,1,2
//     assignment         = [0,1,0,1,2,2]
//
// KFold
//   Contiguous blocks in row order. The first n % k folds get
//   one extra row.
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, RunError};

/// How records are partitioned into folds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldStrategy {
    #[default]
    Stratified,
    KFold,
}

impl std::fmt::Display for FoldStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FoldStrategy::Stratified => f.write_str("stratified"),
            FoldStrategy::KFold => f.write_str("kfold"),
        }
    }
}

/// Fold id of every record, plus the fold count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPlan {
    assignment: Vec<usize>,
    n_folds: usize,
}

impl FoldPlan {
    /// Partition `labels.len()` records into `n_folds` folds.
    ///
    /// # Errors
    /// * `InvalidFoldCount` when `n_folds < 2`
    /// * `InsufficientFoldData` when there are fewer records than
    ///   folds, or (stratified) a class has fewer rows than folds
    pub fn new(strategy: FoldStrategy, labels: &[i64], n_folds: usize) -> Result<Self> {
        if n_folds < 2 {
            return Err(RunError::InvalidFoldCount(n_folds));
        }
        if labels.len() < n_folds {
            return Err(RunError::insufficient_folds(format!(
                "{} folds requested but only {} records available",
                n_folds,
                labels.len()
            )));
        }

        let assignment = match strategy {
            FoldStrategy::Stratified => stratified_assignment(labels, n_folds)?,
            FoldStrategy::KFold => kfold_assignment(labels.len(), n_folds),
        };

        let plan = Self { assignment, n_folds };
        tracing::debug!("{} fold plan: sizes {:?}", strategy, plan.fold_sizes());
        Ok(plan)
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Fold id per record, in record order
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Records held out in `fold`, ascending
    pub fn test_indices(&self, fold: usize) -> Vec<usize> {
        self.indices_where(|f| f == fold)
    }

    /// Records used for training when `fold` is held out, ascending
    pub fn train_indices(&self, fold: usize) -> Vec<usize> {
        self.indices_where(|f| f != fold)
    }

    /// Number of held-out records per fold
    pub fn fold_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_folds];
        for &f in &self.assignment {
            sizes[f] += 1;
        }
        sizes
    }

    fn indices_where(&self, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.assignment
            .iter()
            .enumerate()
            .filter(|&(_, &f)| keep(f))
            .map(|(i, _)| i)
            .collect()
    }
}

fn stratified_assignment(labels: &[i64], k: usize) -> Result<Vec<usize>> {
    // ── Number classes by first appearance ────────────────────────────────────
    let mut codes: HashMap<i64, usize> = HashMap::new();
    let mut classes: Vec<i64> = Vec::new();
    let encoded: Vec<usize> = labels
        .iter()
        .map(|label| {
            *codes.entry(*label).or_insert_with(|| {
                classes.push(*label);
                classes.len() - 1
            })
        })
        .collect();

    let mut counts = vec![0usize; classes.len()];
    for &c in &encoded {
        counts[c] += 1;
    }

    if let Some((c, &count)) = counts.iter().enumerate().find(|&(_, &n)| n < k) {
        return Err(RunError::insufficient_folds(format!(
            "class {} has {} records, fewer than the {} folds; some fold would hold none of it",
            classes[c], count, k
        )));
    }

    // ── Deal the sorted class sequence round-robin ────────────────────────────
    let mut sorted = encoded.clone();
    sorted.sort_unstable();
    let mut allocation = vec![vec![0usize; classes.len()]; k];
    for (i, &c) in sorted.iter().enumerate() {
        allocation[i % k][c] += 1;
    }

    // ── Hand out fold ids per class in row order ──────────────────────────────
    let mut assignment = vec![0usize; labels.len()];
    for c in 0..classes.len() {
        let folds_for_class = (0..k).flat_map(|f| std::iter::repeat(f).take(allocation[f][c]));
        let rows = encoded.iter().enumerate().filter(|&(_, &e)| e == c).map(|(i, _)| i);
        for (row, fold) in rows.zip(folds_for_class) {
            assignment[row] = fold;
        }
    }

    Ok(assignment)
}

fn kfold_assignment(n: usize, k: usize) -> Vec<usize> {
    let base = n / k;
    let extra = n % k;
    (0..k)
        .flat_map(|f| {
            let size = base + usize::from(f < extra);
            std::iter::repeat(f).take(size)
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_example() {
        let plan = FoldPlan::new(FoldStrategy::Stratified, &[1, 1, 0, 0, 1, 0], 3).unwrap();
        assert_eq!(plan.assignment(), &[0, 1, 0, 1, 2, 2]);
        assert_eq!(plan.test_indices(2), vec![4, 5]);
        assert_eq!(plan.train_indices(2), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stratified_keeps_class_ratio() {
        // 12 positives, 6 negatives, 3 folds → 4 + 2 per fold
        let labels: Vec<i64> = (0..18).map(|i| i64::from(i % 3 != 0)).collect();
        let plan = FoldPlan::new(FoldStrategy::Stratified, &labels, 3).unwrap();
        for fold in 0..3 {
            let held = plan.test_indices(fold);
            let pos = held.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(held.len(), 6);
            assert_eq!(pos, 4);
        }
    }

    #[test]
    fn test_every_record_in_exactly_one_fold() {
        let labels: Vec<i64> = (0..23).map(|i| (i * 7 % 5 == 0) as i64).collect();
        let plan = FoldPlan::new(FoldStrategy::Stratified, &labels, 4).unwrap();
        let mut seen = vec![0; labels.len()];
        for fold in 0..4 {
            for i in plan.test_indices(fold) {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
        assert_eq!(plan.fold_sizes().iter().sum::<usize>(), 23);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let labels = [0, 1, 1, 0, 1, 0, 0, 1, 1];
        let a = FoldPlan::new(FoldStrategy::Stratified, &labels, 3).unwrap();
        let b = FoldPlan::new(FoldStrategy::Stratified, &labels, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rare_class_is_rejected() {
        let err = FoldPlan::new(FoldStrategy::Stratified, &[0, 0, 0, 0, 1], 3).unwrap_err();
        assert!(matches!(err, RunError::InsufficientFoldData { .. }));
    }

    #[test]
    fn test_fold_count_checks() {
        assert!(matches!(
            FoldPlan::new(FoldStrategy::KFold, &[0, 1, 0], 1).unwrap_err(),
            RunError::InvalidFoldCount(1)
        ));
        assert!(matches!(
            FoldPlan::new(FoldStrategy::KFold, &[0, 1], 3).unwrap_err(),
            RunError::InsufficientFoldData { .. }
        ));
    }

    #[test]
    fn test_kfold_contiguous_blocks() {
        let plan = FoldPlan::new(FoldStrategy::KFold, &[0; 10], 3).unwrap();
        assert_eq!(plan.assignment(), &[0, 0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(plan.fold_sizes(), vec![4, 3, 3]);
    }
}
