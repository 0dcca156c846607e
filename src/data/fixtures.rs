// ============================================================
// Layer 4 - Synthetic Heart Records (test support)
// ============================================================
// Generates reproducible records with the heart-disease schema.
// The label depends on thalach, cp and oldpeak plus a little
// noise, so a forest can learn it but not perfectly.

use std::io::Write;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tempfile::NamedTempFile;

use crate::domain::dataset::{Dataset, TARGET_COLUMN};

/// Header order used by the generated CSV
pub const HEADER: [&str; 14] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal", TARGET_COLUMN,
];

/// `n` rows of cells in `HEADER` order, target last
pub fn heart_rows(n: usize, seed: u64) -> Vec<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let cp: u8 = rng.gen_range(0..4);
            let thalach: u32 = rng.gen_range(90..200);
            let oldpeak: f64 = (rng.gen_range(0..60) as f64) / 10.0;
            let score = (thalach as f64 - 145.0) / 20.0 + cp as f64 * 0.8 - oldpeak * 0.6;
            let noise: f64 = rng.gen_range(-0.5..0.5);
            // Alternate labels on the first rows so small sets still hold both classes
            let target = match i {
                0 => 0,
                1 => 1,
                _ => i64::from(score + noise > 0.0),
            };
            // Leave the odd cholesterol reading blank to exercise imputation
            let chol = if i % 17 == 5 {
                String::new()
            } else {
                rng.gen_range(150..400).to_string()
            };

            vec![
                rng.gen_range(29..78).to_string(),
                rng.gen_range(0..2).to_string(),
                cp.to_string(),
                rng.gen_range(94..200).to_string(),
                chol,
                rng.gen_range(0..2).to_string(),
                rng.gen_range(0..3).to_string(),
                thalach.to_string(),
                rng.gen_range(0..2).to_string(),
                format!("{oldpeak:.1}"),
                rng.gen_range(0..3).to_string(),
                rng.gen_range(0..4).to_string(),
                rng.gen_range(1..4).to_string(),
                target.to_string(),
            ]
        })
        .collect()
}

/// The generated rows as an in-memory `Dataset`
pub fn heart_dataset(n: usize, seed: u64) -> Dataset {
    let rows = heart_rows(n, seed);
    let columns = HEADER[..13].iter().map(|s| s.to_string()).collect();
    let target = rows.iter().map(|r| r[13].parse().unwrap()).collect();
    let cells = rows.into_iter().map(|mut r| {
        r.truncate(13);
        r
    });
    Dataset::new("synthetic", columns, cells.collect(), target)
}

/// The generated rows written to a temporary CSV file
pub fn heart_csv(n: usize, seed: u64) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER.join(",")).unwrap();
    for row in heart_rows(n, seed) {
        writeln!(file, "{}", row.join(",")).unwrap();
    }
    file.flush().unwrap();
    file
}
