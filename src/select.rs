//! Candidate selection.
//!
//! A selection policy picks at most one candidate per page. Eligibility
//! (draft/pre-release toggles) and name matching are separate predicates,
//! combined with AND for the regex and latest policies. A pinned version
//! matches by plain name equality and ignores eligibility, so a maintainer
//! can pin a draft deliberately.

use regex::Regex;

use crate::error::{GenError, Result};
use crate::provider::CandidateEntry;

/// How a candidate is recognized. Pin and select are mutually exclusive;
/// that is validated when the package metadata is parsed.
#[derive(Debug, Clone)]
pub enum SelectPolicy {
    /// First candidate passing the eligibility test, in upstream order.
    Latest,
    /// First candidate whose name equals the pinned version.
    Pin(String),
    /// First eligible candidate whose name matches the pattern.
    Select(Regex),
}

impl SelectPolicy {
    pub fn pin(version: impl Into<String>) -> Self {
        Self::Pin(version.into())
    }

    /// Build a policy from the optional `select` and `version` package keys.
    pub fn from_options(
        select: Option<&str>,
        pin: Option<&str>,
        pkgname: &str,
    ) -> Result<Self> {
        match (select, pin) {
            (Some(_), Some(_)) => Err(GenError::Config(format!(
                "cannot have both a \"version\" and a \"select\" key for \"{pkgname}\""
            ))),
            (Some(pattern), None) => {
                let re = Regex::new(pattern).map_err(|e| {
                    GenError::Config(format!(
                        "bad \"select\" pattern for \"{pkgname}\": {e}"
                    ))
                })?;
                Ok(Self::Select(re))
            }
            (None, Some(version)) => Ok(Self::pin(version)),
            (None, None) => Ok(Self::Latest),
        }
    }
}

/// Draft/pre-release toggles for release queries. Tag and commit candidates
/// carry neither flag, so the default passes them through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eligibility {
    pub include_drafts: bool,
    pub include_pre_releases: bool,
}

impl Eligibility {
    pub fn permits(&self, candidate: &CandidateEntry) -> bool {
        (self.include_drafts || !candidate.draft)
            && (self.include_pre_releases || !candidate.prerelease)
    }
}

/// Pick at most one candidate from a page. `None` means "advance to the
/// next page".
pub fn pick<'a>(
    page: &'a [CandidateEntry],
    policy: &SelectPolicy,
    eligibility: &Eligibility,
) -> Option<&'a CandidateEntry> {
    match policy {
        SelectPolicy::Pin(version) => page.iter().find(|c| c.name == *version),
        SelectPolicy::Select(re) => page
            .iter()
            .find(|c| eligibility.permits(c) && re.is_match(&c.name)),
        SelectPolicy::Latest => page.iter().find(|c| eligibility.permits(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, draft: bool, prerelease: bool) -> CandidateEntry {
        CandidateEntry {
            name: name.to_string(),
            id: name.to_string(),
            created_at: None,
            draft,
            prerelease,
            archive_url: String::new(),
            assets: vec![],
        }
    }

    #[test]
    fn test_pin_first_match_wins() {
        let page = [
            entry("v2.0.0", false, false),
            entry("v1.0.0", false, false),
            entry("v1.0.0", true, false),
        ];
        let picked = pick(&page, &SelectPolicy::pin("v1.0.0"), &Eligibility::default());
        assert!(std::ptr::eq(picked.unwrap(), &page[1]));
    }

    #[test]
    fn test_pin_ignores_eligibility() {
        let page = [entry("v1.0.0", true, true)];
        let picked = pick(&page, &SelectPolicy::pin("v1.0.0"), &Eligibility::default());
        assert_eq!(picked.unwrap().name, "v1.0.0");
    }

    #[test]
    fn test_select_respects_eligibility() {
        let page = [
            entry("v1.2.0", false, true),
            entry("nightly", false, false),
            entry("v1.1.0", false, false),
        ];
        let policy = SelectPolicy::from_options(Some(r"^v\d+\.\d+\.\d+$"), None, "pkg").unwrap();

        let picked = pick(&page, &policy, &Eligibility::default()).unwrap();
        assert_eq!(picked.name, "v1.1.0");

        let lenient = Eligibility {
            include_pre_releases: true,
            ..Eligibility::default()
        };
        let picked = pick(&page, &policy, &lenient).unwrap();
        assert_eq!(picked.name, "v1.2.0");
    }

    #[test]
    fn test_select_is_unanchored_search() {
        let page = [entry("release-1.2.3-final", false, false)];
        let policy = SelectPolicy::from_options(Some(r"\d+\.\d+\.\d+"), None, "pkg").unwrap();
        assert!(pick(&page, &policy, &Eligibility::default()).is_some());
    }

    #[test]
    fn test_latest_skips_drafts_and_prereleases() {
        let page = [
            entry("v2.0.0-draft", true, false),
            entry("v2.0.0-rc1", false, true),
            entry("v1.9.0", false, false),
        ];
        let picked = pick(&page, &SelectPolicy::Latest, &Eligibility::default()).unwrap();
        assert_eq!(picked.name, "v1.9.0");
    }

    #[test]
    fn test_latest_with_toggles() {
        let page = [entry("v2.0.0-draft", true, false)];
        assert!(pick(&page, &SelectPolicy::Latest, &Eligibility::default()).is_none());

        let lenient = Eligibility {
            include_drafts: true,
            include_pre_releases: false,
        };
        assert!(pick(&page, &SelectPolicy::Latest, &lenient).is_some());
    }

    #[test]
    fn test_no_match_signals_advance() {
        let page = [entry("nightly", false, false)];
        let policy = SelectPolicy::from_options(Some(r"^\d+$"), None, "pkg").unwrap();
        assert!(pick(&page, &policy, &Eligibility::default()).is_none());
    }

    #[test]
    fn test_pin_and_select_are_mutually_exclusive() {
        let err = SelectPolicy::from_options(Some("^v"), Some("v1.0.0"), "pkg").unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn test_bad_select_pattern_is_config_error() {
        let err = SelectPolicy::from_options(Some("("), None, "pkg").unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }
}
