// ============================================================
// Layer 4 - CSV Dataset Loader
// ============================================================
// Reads a delimited file with a header row into a `Dataset`.
//
// Schema rules:
//   - the header must contain `target` plus every categorical
//     and numeric attribute of the heart-disease schema
//   - columns may appear in any order; unknown columns are
//     ignored
//   - every record must have the header's field count
//   - `target` must be an integer on every record
//
// Any violation is a `DataLoadFailure` that names the file,
// and the record number where applicable.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::{fs::File, io::BufReader, path::Path};

use crate::domain::dataset::{Dataset, CATEGORICAL_ATTRS, NUMERIC_ATTRS, TARGET_COLUMN};
use crate::domain::error::{Result, RunError};

/// Loads heart-disease records from one CSV file.
pub struct CsvLoader {
    path: String,
    delimiter: u8,
}

impl CsvLoader {
    /// Create a loader for a comma-delimited file
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Use a different single-byte field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read and validate the whole file.
    pub fn load(&self) -> Result<Dataset> {
        let path = Path::new(&self.path);
        let file = File::open(path)
            .map_err(|e| RunError::data_load(&self.path, format!("cannot open file: {e}")))?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = reader
            .headers()
            .map_err(|e| RunError::data_load(&self.path, format!("cannot read header: {e}")))?
            .clone();

        // ── Resolve the schema against the header ─────────────────────────────
        let target_idx = find_column(&headers, TARGET_COLUMN)
            .ok_or_else(|| RunError::data_load(&self.path, "missing column 'target'"))?;

        let missing: Vec<&str> = CATEGORICAL_ATTRS
            .iter()
            .chain(NUMERIC_ATTRS.iter())
            .copied()
            .filter(|name| find_column(&headers, name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(RunError::data_load(
                &self.path,
                format!("missing columns: {}", missing.join(", ")),
            ));
        }

        // Feature columns keep header order, label excluded
        let feature_idx: Vec<usize> = (0..headers.len()).filter(|&i| i != target_idx).collect();
        let columns: Vec<String> = feature_idx
            .iter()
            .map(|&i| headers[i].to_string())
            .collect();

        // ── Read every record ─────────────────────────────────────────────────
        let mut cells = Vec::new();
        let mut target = Vec::new();

        for (n, result) in reader.records().enumerate() {
            // Record 1 is the first line after the header
            let line = n + 1;
            let record = result
                .map_err(|e| RunError::data_load(&self.path, format!("record {line}: {e}")))?;

            let raw_label = record.get(target_idx).unwrap_or_default();
            let label = raw_label.parse::<i64>().map_err(|_| {
                RunError::data_load(
                    &self.path,
                    format!("record {line}: target {raw_label:?} is not an integer"),
                )
            })?;

            let row: Vec<String> = feature_idx
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect();

            cells.push(row);
            target.push(label);
        }

        if target.is_empty() {
            return Err(RunError::data_load(&self.path, "file has no data rows"));
        }

        tracing::info!(
            "Loaded {} records with {} feature columns from '{}'",
            target.len(),
            columns.len(),
            self.path
        );

        Ok(Dataset::new(self.path.clone(), columns, cells, target))
    }
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal,target";

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_loads_well_formed_file() {
        let file = write_csv(&[
            HEADER,
            "63,1,3,145,233,1,0,150,0,2.3,0,0,1,1",
            "37,1,2,130,250,0,1,187,0,3.5,0,0,2,0",
        ]);
        let ds = CsvLoader::new(file.path().to_string_lossy()).load().unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns.len(), 13);
        assert!(ds.column_index("target").is_none());
        assert_eq!(ds.target, vec![1, 0]);
        let chol = ds.column_index("chol").unwrap();
        assert_eq!(ds.cells[1][chol], "250");
    }

    #[test]
    fn test_missing_file() {
        let err = CsvLoader::new("/definitely/not/here.csv").load().unwrap_err();
        assert!(matches!(err, RunError::DataLoadFailure { .. }));
    }

    #[test]
    fn test_missing_schema_column() {
        let file = write_csv(&["age,sex,target", "63,1,1"]);
        let err = CsvLoader::new(file.path().to_string_lossy()).load().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cp"));
        assert!(msg.contains("thal"));
    }

    #[test]
    fn test_non_integer_target() {
        let file = write_csv(&[HEADER, "63,1,3,145,233,1,0,150,0,2.3,0,0,1,yes"]);
        let err = CsvLoader::new(file.path().to_string_lossy()).load().unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_ragged_record_rejected() {
        let file = write_csv(&[HEADER, "63,1,3"]);
        let err = CsvLoader::new(file.path().to_string_lossy()).load().unwrap_err();
        assert!(matches!(err, RunError::DataLoadFailure { .. }));
    }

    #[test]
    fn test_header_only_is_rejected() {
        let file = write_csv(&[HEADER]);
        assert!(CsvLoader::new(file.path().to_string_lossy()).load().is_err());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let header = HEADER.replace(',', ";");
        let file = write_csv(&[&header, "63;1;3;145;233;1;0;150;0;2.3;0;0;1;1"]);
        let ds = CsvLoader::new(file.path().to_string_lossy())
            .with_delimiter(b';')
            .load()
            .unwrap();
        assert_eq!(ds.len(), 1);
    }
}
