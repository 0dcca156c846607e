// ============================================================
// Layer 5 - Cross-Validated (Out-of-Fold) Predictor
// ============================================================
// For each fold of a FoldPlan:
//
//   1. build a fresh classifier
//   2. fit it on every row outside the fold
//   3. predict the rows inside the fold
//   4. write those predictions to the rows' own indices
//   5. record the fold's train / held-out row counts
//
// Every record is predicted exactly once, by a model that never
// saw it. Because results are written by index, the output order
// is the input order no matter which fold finishes first.
//
// With `workers > 1` folds run on a dedicated rayon pool. Folds
// only read the shared matrix and labels.
//
// Reference: rayon crate documentation
//            Rust Book §16 (Fearless Concurrency)

use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;

use crate::data::splitter::FoldPlan;
use crate::domain::error::{Result, RunError};
use crate::domain::report::{FoldRecord, PredictionResult};
use crate::domain::traits::Classifier;

/// Held-out rows of one fold and what the model predicted for them
struct FoldOutcome {
    record: FoldRecord,
    test_indices: Vec<usize>,
    predictions: Vec<i64>,
}

/// Produce one out-of-fold prediction per record.
///
/// `make_classifier` is called once per fold; it must return an
/// unfitted classifier each time.
///
/// # Errors
/// * `LengthMismatch` when `labels` and `features` disagree on the
///   row count, or a classifier returns the wrong number of labels
/// * any error raised by the classifier's `fit` or `predict`
pub fn predict_oof<C, F>(
    features: ArrayView2<'_, f64>,
    labels: &[i64],
    make_classifier: F,
    plan: &FoldPlan,
    workers: usize,
) -> Result<PredictionResult>
where
    C: Classifier,
    F: Fn() -> C + Sync,
{
    let n = labels.len();
    for actual in [features.nrows(), plan.assignment().len()] {
        if actual != n {
            return Err(RunError::LengthMismatch { expected: n, actual });
        }
    }

    let fold_job = |fold: usize| run_fold(features, labels, &make_classifier, plan, fold);

    let outcomes: Vec<FoldOutcome> = if workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| RunError::WorkerPool(e.to_string()))?;
        tracing::debug!("Running {} folds on {} worker threads", plan.n_folds(), workers);
        pool.install(|| {
            (0..plan.n_folds())
                .into_par_iter()
                .map(fold_job)
                .collect::<Result<Vec<_>>>()
        })?
    } else {
        (0..plan.n_folds())
            .map(fold_job)
            .collect::<Result<Vec<_>>>()?
    };

    // ── Assemble predictions in input order ───────────────────────────────────
    let mut predicted = vec![0i64; n];
    let mut filled = vec![false; n];
    let mut folds = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        folds.push(outcome.record);
        for (&row, &label) in outcome.test_indices.iter().zip(&outcome.predictions) {
            predicted[row] = label;
            filled[row] = true;
        }
    }
    debug_assert!(filled.iter().all(|&f| f), "every record belongs to one fold");

    Ok(PredictionResult {
        true_labels: labels.to_vec(),
        predicted_labels: predicted,
        folds,
    })
}

fn run_fold<C, F>(
    features: ArrayView2<'_, f64>,
    labels: &[i64],
    make_classifier: &F,
    plan: &FoldPlan,
    fold: usize,
) -> Result<FoldOutcome>
where
    C: Classifier,
    F: Fn() -> C,
{
    let train_indices = plan.train_indices(fold);
    let test_indices = plan.test_indices(fold);

    let x_train = features.select(Axis(0), &train_indices);
    let y_train: Vec<i64> = train_indices.iter().map(|&i| labels[i]).collect();
    let x_test = features.select(Axis(0), &test_indices);

    let mut classifier = make_classifier();
    classifier.fit(x_train.view(), &y_train)?;
    tracing::debug!(fold, train_rows = train_indices.len(), "fold fitted");

    let predictions = classifier.predict(x_test.view())?;
    if predictions.len() != test_indices.len() {
        return Err(RunError::LengthMismatch {
            expected: test_indices.len(),
            actual: predictions.len(),
        });
    }
    tracing::debug!(fold, held_out_rows = test_indices.len(), "fold predicted");

    Ok(FoldOutcome {
        record: FoldRecord {
            fold,
            train_rows: train_indices.len(),
            held_out_rows: test_indices.len(),
        },
        test_indices,
        predictions,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::splitter::FoldStrategy;
    use crate::ml::forest::{ForestParams, RandomForest};
    use ndarray::Array2;

    /// Predicts the majority training label for every row and
    /// remembers which rows (by feature value) it was trained on.
    #[derive(Default)]
    struct Majority {
        label: i64,
        seen: Vec<f64>,
    }

    impl Classifier for Majority {
        fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[i64]) -> Result<()> {
            let ones = labels.iter().filter(|&&l| l == 1).count();
            self.label = i64::from(ones * 2 > labels.len());
            self.seen = features.column(0).to_vec();
            Ok(())
        }

        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>> {
            // Leakage check: a held-out row must never have been trained on
            for x in features.column(0) {
                assert!(!self.seen.contains(x), "row {x} leaked into training");
            }
            Ok(vec![self.label; features.nrows()])
        }
    }

    /// Echoes the row id back as the prediction
    struct Echo;

    impl Classifier for Echo {
        fn fit(&mut self, _: ArrayView2<'_, f64>, _: &[i64]) -> Result<()> {
            Ok(())
        }

        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>> {
            Ok(features.column(0).iter().map(|&x| x as i64).collect())
        }
    }

    fn row_ids(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 1), |(i, _)| i as f64)
    }

    #[test]
    fn test_output_in_input_order() {
        let labels: Vec<i64> = (0..17).map(|i| i % 2).collect();
        let x = row_ids(17);
        for strategy in [FoldStrategy::Stratified, FoldStrategy::KFold] {
            let plan = FoldPlan::new(strategy, &labels, 4).unwrap();
            let result = predict_oof(x.view(), &labels, || Echo, &plan, 1).unwrap();
            assert_eq!(result.len(), 17);
            let expected: Vec<i64> = (0..17).collect();
            assert_eq!(result.predicted_labels, expected);
            assert_eq!(result.true_labels, labels);
        }
    }

    #[test]
    fn test_no_record_predicts_itself() {
        let labels: Vec<i64> = (0..12).map(|i| i64::from(i < 5)).collect();
        let plan = FoldPlan::new(FoldStrategy::Stratified, &labels, 3).unwrap();
        let result = predict_oof(row_ids(12).view(), &labels, Majority::default, &plan, 1).unwrap();
        assert_eq!(result.len(), 12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let x = Array2::from_shape_fn((60, 4), |(i, j)| ((i * 31 + j * 17) % 23) as f64);
        let labels: Vec<i64> = (0..60).map(|i| i64::from((i * 31 % 23) > 11)).collect();
        let plan = FoldPlan::new(FoldStrategy::Stratified, &labels, 3).unwrap();
        let make = || {
            RandomForest::new(ForestParams {
                n_estimators: 10,
                max_depth: 4,
                max_features: 2,
                random_state: 42,
            })
        };

        let sequential = predict_oof(x.view(), &labels, make, &plan, 1).unwrap();
        let parallel = predict_oof(x.view(), &labels, make, &plan, 3).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_classifier_errors_propagate() {
        let labels: Vec<i64> = (0..9).map(|i| i % 2).collect();
        let plan = FoldPlan::new(FoldStrategy::KFold, &labels, 3).unwrap();
        let make = || {
            RandomForest::new(ForestParams {
                max_depth: 0,
                ..ForestParams::default()
            })
        };
        let err = predict_oof(row_ids(9).view(), &labels, make, &plan, 1).unwrap_err();
        assert!(matches!(err, RunError::InvalidHyperparameter { name: "max_depth", .. }));
    }

    #[test]
    fn test_row_count_mismatch() {
        let labels = vec![0, 1, 0, 1];
        let plan = FoldPlan::new(FoldStrategy::KFold, &labels, 2).unwrap();
        let err = predict_oof(row_ids(3).view(), &labels, || Echo, &plan, 1).unwrap_err();
        assert!(matches!(err, RunError::LengthMismatch { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_plan_length_mismatch_reports_plan_length() {
        let plan = FoldPlan::new(FoldStrategy::KFold, &[0, 1, 0, 1, 0, 1], 2).unwrap();
        let labels = vec![0, 1, 0, 1];
        let err = predict_oof(row_ids(4).view(), &labels, || Echo, &plan, 1).unwrap_err();
        assert!(matches!(err, RunError::LengthMismatch { expected: 4, actual: 6 }));
    }

    #[test]
    fn test_fold_records_follow_plan() {
        let labels: Vec<i64> = (0..10).map(|i| i % 2).collect();
        let plan = FoldPlan::new(FoldStrategy::KFold, &labels, 3).unwrap();
        let result = predict_oof(row_ids(10).view(), &labels, || Echo, &plan, 2).unwrap();

        let expected: Vec<FoldRecord> = plan
            .fold_sizes()
            .into_iter()
            .enumerate()
            .map(|(fold, size)| FoldRecord {
                fold,
                train_rows: 10 - size,
                held_out_rows: size,
            })
            .collect();
        assert_eq!(result.folds, expected);
    }
}
