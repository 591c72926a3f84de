//! Version string derivation.
//!
//! Tag, release, and URL queries derive their version by running the raw
//! candidate name through an ordered list of search/replace transforms.
//! Commit queries instead reformat the committer timestamp as `YYYYMMDD`.

use chrono::NaiveDateTime;

use crate::error::{GenError, Result};

/// One search/replace step of the version pipeline.
///
/// `pattern` is a regular expression; `replacement` may reference capture
/// groups with `$1`, `$name` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    pub pattern: String,
    pub replacement: String,
}

impl Transform {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Apply each transform in order, feeding every output into the next input.
///
/// An empty list returns the input verbatim.
pub fn apply_transforms(input: &str, transforms: &[Transform]) -> Result<String> {
    let mut current = input.to_string();
    for transform in transforms {
        let re = regex::Regex::new(&transform.pattern).map_err(|e| {
            GenError::Transform(format!("bad pattern \"{}\": {}", transform.pattern, e))
        })?;
        current = re
            .replace_all(&current, transform.replacement.as_str())
            .into_owned();
    }
    Ok(current)
}

/// Reformat a committer timestamp (`YYYY-MM-DDTHH:MM:SSZ`, UTC) as `YYYYMMDD`.
pub fn commit_date_version(timestamp: &str) -> Result<String> {
    let parsed = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%SZ")
        .map_err(|_| GenError::Transform(format!("unexpected committer date \"{timestamp}\"")))?;
    Ok(parsed.format("%Y%m%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_transforms_returns_input_verbatim() {
        assert_eq!(apply_transforms("v1.2.3", &[]).unwrap(), "v1.2.3");
    }

    #[test]
    fn test_single_transform() {
        let transforms = [Transform::new("v", "")];
        assert_eq!(apply_transforms("v1.2.3", &transforms).unwrap(), "1.2.3");
    }

    #[test]
    fn test_transforms_apply_in_order() {
        // Second transform only matches the first transform's output.
        let transforms = [
            Transform::new("^release-", "r"),
            Transform::new("^r", "v"),
        ];
        assert_eq!(
            apply_transforms("release-1.0", &transforms).unwrap(),
            "v1.0"
        );
    }

    #[test]
    fn test_transform_chaining_equals_full_pipeline() {
        // Splitting a pipeline in two and chaining must equal one full run.
        let transforms = [
            Transform::new("v", ""),
            Transform::new(r"\.0$", ""),
            Transform::new("^1", "one-"),
            Transform::new("-", "_"),
        ];
        let full = apply_transforms("v1.5.0", &transforms).unwrap();

        let half = apply_transforms("v1.5.0", &transforms[..2]).unwrap();
        let chained = apply_transforms(&half, &transforms[2..]).unwrap();
        assert_eq!(full, chained);
        assert_eq!(full, "one_.5");
    }

    #[test]
    fn test_capture_group_replacement() {
        let transforms = [Transform::new(r"^v(\d+)\.(\d+)$", "$1-$2")];
        assert_eq!(apply_transforms("v6.17", &transforms).unwrap(), "6-17");
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let transforms = [Transform::new("(", "")];
        let err = apply_transforms("v1.0", &transforms).unwrap_err();
        assert!(err.to_string().contains("invalid version transform"));
    }

    #[test]
    fn test_commit_date_version() {
        assert_eq!(
            commit_date_version("2024-03-02T10:00:00Z").unwrap(),
            "20240302"
        );
    }

    #[test]
    fn test_commit_date_version_rejects_garbage() {
        assert!(commit_date_version("yesterday").is_err());
        assert!(commit_date_version("2024-03-02").is_err());
    }
}
