// ============================================================
// Layer 3 - Run Parameters
// ============================================================
// The three positional parameters of a training run:
//
//   <program> <source_path> <max_depth> <max_features>
//
// `parse_parameters` receives the whole argument sequence
// (program name included) as a plain slice, so it never reads
// process-wide state and can be called directly from tests.
//
// Only the syntax of the two integers is checked here.
// Zero or negative values are accepted and left for the
// classifier to reject when it is fitted.
//
// Reference: Rust Book §12.1 (Accepting Command Line Arguments)

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, RunError};

/// Typed form of the three positional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Path to the CSV file with the heart-disease records
    pub source_path: String,

    /// Maximum depth of every tree in the forest
    pub max_depth: i64,

    /// Number of candidate features examined at each split
    pub max_features: i64,
}

/// Convert raw positional tokens into `RunParameters`.
///
/// `args[0]` is the program name and is ignored. Tokens past
/// index 3 are ignored as well.
///
/// # Errors
/// * `MissingArgument` when fewer than 4 tokens are supplied
/// * `InvalidNumericFormat` when token 2 or 3 is not a base-10 integer
pub fn parse_parameters<S: AsRef<str>>(args: &[S]) -> Result<RunParameters> {
    let source_path = positional(args, 1, "source_path")?.to_string();
    let max_depth = parse_int(positional(args, 2, "max_depth")?, "max_depth")?;
    let max_features = parse_int(positional(args, 3, "max_features")?, "max_features")?;

    Ok(RunParameters {
        source_path,
        max_depth,
        max_features,
    })
}

fn positional<'a, S: AsRef<str>>(
    args: &'a [S],
    position: usize,
    name: &'static str,
) -> Result<&'a str> {
    args.get(position)
        .map(|s| s.as_ref())
        .ok_or(RunError::MissingArgument { position, name })
}

// `str::parse::<i64>` already rejects surrounding whitespace,
// decimal points and exponents, which is exactly the contract.
fn parse_int(raw: &str, name: &'static str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|source| RunError::InvalidNumericFormat {
            name,
            value: raw.to_string(),
            source,
        })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_arguments() {
        let params = parse_parameters(&["prog", "data.csv", "10", "5"]).unwrap();
        assert_eq!(
            params,
            RunParameters {
                source_path: "data.csv".to_string(),
                max_depth: 10,
                max_features: 5,
            }
        );
    }

    #[test]
    fn test_missing_arguments() {
        let err = parse_parameters(&["prog", "data.csv"]).unwrap_err();
        assert!(matches!(
            err,
            RunError::MissingArgument { position: 2, name: "max_depth" }
        ));

        let err = parse_parameters(&["prog", "data.csv", "3"]).unwrap_err();
        assert!(matches!(err, RunError::MissingArgument { position: 3, .. }));

        let empty: [&str; 0] = [];
        assert!(matches!(
            parse_parameters(&empty).unwrap_err(),
            RunError::MissingArgument { position: 1, .. }
        ));
    }

    #[test]
    fn test_invalid_integer() {
        let err = parse_parameters(&["prog", "data.csv", "invalid", "5"]).unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidNumericFormat { name: "max_depth", .. }
        ));

        let err = parse_parameters(&["prog", "data.csv", "5", "2.5"]).unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidNumericFormat { name: "max_features", .. }
        ));
    }

    #[test]
    fn test_whitespace_is_not_tolerated() {
        assert!(parse_parameters(&["prog", "data.csv", " 5", "3"]).is_err());
        assert!(parse_parameters(&["prog", "data.csv", "5", "3 "]).is_err());
    }

    #[test]
    fn test_no_range_validation() {
        let params = parse_parameters(&["prog", "d.csv", "0", "-4"]).unwrap();
        assert_eq!(params.max_depth, 0);
        assert_eq!(params.max_features, -4);
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let params = parse_parameters(&["prog", "d.csv", "1", "2", "extra"]).unwrap();
        assert_eq!(params.max_features, 2);
    }

    #[test]
    fn test_parsing_is_repeatable() {
        let args = vec!["prog".to_string(), "d.csv".into(), "7".into(), "3".into()];
        assert_eq!(parse_parameters(&args).unwrap(), parse_parameters(&args).unwrap());
    }
}
