// ============================================================
// Layer 5 - Metric Reporter
// ============================================================
// Computes the four run metrics from out-of-fold predictions
// and writes them to the tracking run.
//
// Labels are binarised against one configurable positive label
// (everything else counts as negative), giving the 2x2 table:
//
//                    predicted +   predicted -
//     actual +          TP            FN
//     actual -          FP            TN
//
//   Precision  TP / (TP + FP)
//   Recall     TP / (TP + FN)
//   F1         2PR / (P + R)
//   MCC        (TP*TN - FP*FN) /
//              sqrt((TP+FP)(TP+FN)(TN+FP)(TN+FN))
//
// Each is 0.0 when its denominator is 0.
//
// All four values are computed before the first write, so a
// failure during computation leaves nothing in the sink.
//
// Reference: Matthews (1975) Comparison of the predicted and observed
//            secondary structure of T4 phage lysozyme

use std::collections::BTreeSet;

use crate::domain::error::{Result, RunError};
use crate::domain::report::{ConfusionCounts, MetricReport};
use crate::domain::traits::{MetricSink, RunHandle};

/// Count TP / FP / TN / FN of `predicted` against `truth`.
pub fn confusion(truth: &[i64], predicted: &[i64], positive: i64) -> Result<ConfusionCounts> {
    if truth.len() != predicted.len() {
        return Err(RunError::LengthMismatch {
            expected: truth.len(),
            actual: predicted.len(),
        });
    }

    let mut c = ConfusionCounts::default();
    for (&t, &p) in truth.iter().zip(predicted) {
        match (t == positive, p == positive) {
            (true, true) => c.true_pos += 1,
            (false, true) => c.false_pos += 1,
            (false, false) => c.true_neg += 1,
            (true, false) => c.false_neg += 1,
        }
    }
    Ok(c)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

pub fn precision(c: &ConfusionCounts) -> f64 {
    ratio(c.true_pos as f64, (c.true_pos + c.false_pos) as f64)
}

pub fn recall(c: &ConfusionCounts) -> f64 {
    ratio(c.true_pos as f64, (c.true_pos + c.false_neg) as f64)
}

/// Harmonic mean of precision and recall
pub fn f1(precision: f64, recall: f64) -> f64 {
    ratio(2.0 * precision * recall, precision + recall)
}

pub fn matthews_correlation(c: &ConfusionCounts) -> f64 {
    let (tp, fp, tn, fn_) = (
        c.true_pos as f64,
        c.false_pos as f64,
        c.true_neg as f64,
        c.false_neg as f64,
    );
    let den = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
    ratio(tp * tn - fp * fn_, den)
}

/// Build the four-metric report without touching any sink.
pub fn evaluate(truth: &[i64], predicted: &[i64], positive: i64) -> Result<MetricReport> {
    let counts = confusion(truth, predicted, positive)?;

    let distinct: BTreeSet<i64> = truth.iter().chain(predicted).copied().collect();
    if distinct.len() > 2 {
        tracing::warn!(
            "{} distinct labels {:?}; scoring label {} against all others",
            distinct.len(),
            distinct,
            positive
        );
    }
    if !distinct.contains(&positive) {
        tracing::warn!("Positive label {} never occurs; all metrics will be 0", positive);
    }

    let p = precision(&counts);
    let r = recall(&counts);
    Ok(MetricReport {
        positive_label: positive,
        counts,
        precision: p,
        recall: r,
        f1: f1(p, r),
        mcc: matthews_correlation(&counts),
    })
}

/// Compute the report, then log each metric once (step 0) to `run`.
///
/// # Errors
/// * `LengthMismatch` when the label sequences differ in length;
///   nothing is logged in that case
/// * `SinkFailure` when the sink rejects a write
pub fn compute_and_report<S>(
    truth: &[i64],
    predicted: &[i64],
    positive: i64,
    sink: &mut S,
    run: &RunHandle,
) -> Result<MetricReport>
where
    S: MetricSink + ?Sized,
{
    let report = evaluate(truth, predicted, positive)?;

    for (name, value) in report.entries() {
        sink.log_metric(run, name, value, 0)?;
        tracing::debug!("Logged metric {} = {:.6}", name, value);
    }

    Ok(report)
}
