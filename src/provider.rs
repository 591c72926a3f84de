//! Candidate providers.
//!
//! A provider produces pages of candidate entries (tags, releases, or
//! commits) from a remote source, or a single synthesized entry for a plain
//! URL, plus optional descriptive metadata about the project.

pub mod github;
pub mod url;

use crate::error::{GenError, Result};
use crate::select::{Eligibility, SelectPolicy};

/// Upper bound on page advancement. The upstream list is normally exhausted
/// (empty page) long before this; the cap keeps a misbehaving server from
/// holding the resolution in an endless loop.
pub const MAX_PAGES: u32 = 100;

/// Number of entries requested per page.
pub const PAGE_SIZE: u32 = 100;

/// One tag, release, or commit returned by a source as a possible version
/// match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    /// Tag or release name; commit sha for commit queries.
    pub name: String,
    /// Stable identifier (sha for commits, name otherwise).
    pub id: String,
    /// Committer timestamp, commit queries only.
    pub created_at: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    /// Source archive for this candidate (tarball).
    pub archive_url: String,
    /// Downloadable assets attached to the candidate, in upstream order.
    pub assets: Vec<AssetRef>,
}

/// A downloadable asset attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub name: String,
    pub download_url: String,
}

/// Descriptive project metadata fetched from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub description: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
}

/// Fetch pages in ascending order until the selection policy picks a
/// candidate.
///
/// An empty page means the upstream list is exhausted; together with the
/// page cap that is a terminal not-found condition. Pages are never
/// refetched.
pub fn paginate<F>(
    mut fetch_page: F,
    policy: &SelectPolicy,
    eligibility: &Eligibility,
    subject: &str,
) -> Result<CandidateEntry>
where
    F: FnMut(u32) -> Result<Vec<CandidateEntry>>,
{
    for page in 1..=MAX_PAGES {
        let entries = fetch_page(page)?;
        if entries.is_empty() {
            return Err(GenError::NotFound(format!(
                "unable to find a compatible version for {subject}"
            )));
        }
        if let Some(candidate) = crate::select::pick(&entries, policy, eligibility) {
            return Ok(candidate.clone());
        }
    }
    Err(GenError::NotFound(format!(
        "unable to find a compatible version for {subject} within {MAX_PAGES} pages"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> CandidateEntry {
        CandidateEntry {
            name: name.to_string(),
            id: name.to_string(),
            created_at: None,
            draft: false,
            prerelease: false,
            archive_url: format!("https://example.com/tarball/{name}"),
            assets: vec![],
        }
    }

    #[test]
    fn test_paginate_advances_until_match() {
        let mut fetched_pages = Vec::new();
        let candidate = paginate(
            |page| {
                fetched_pages.push(page);
                Ok(match page {
                    1 => vec![entry("nightly-1"), entry("nightly-2")],
                    2 => vec![entry("nightly-3")],
                    _ => vec![entry("nightly-4"), entry("1.2.3")],
                })
            },
            &SelectPolicy::pin("1.2.3"),
            &Eligibility::default(),
            "GitHub repository a/b",
        )
        .unwrap();

        assert_eq!(candidate.name, "1.2.3");
        assert_eq!(fetched_pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_paginate_empty_page_is_not_found() {
        let err = paginate(
            |page| {
                Ok(match page {
                    1 => vec![entry("nightly")],
                    _ => vec![],
                })
            },
            &SelectPolicy::pin("1.2.3"),
            &Eligibility::default(),
            "GitHub repository a/b",
        )
        .unwrap_err();

        assert!(matches!(err, GenError::NotFound(_)));
        assert!(err.to_string().contains("a/b"));
    }

    #[test]
    fn test_paginate_caps_page_advancement() {
        let mut calls = 0u32;
        let err = paginate(
            |_| {
                calls += 1;
                Ok(vec![entry("never-matches")])
            },
            &SelectPolicy::pin("1.2.3"),
            &Eligibility::default(),
            "GitHub repository a/b",
        )
        .unwrap_err();

        assert_eq!(calls, MAX_PAGES);
        assert!(matches!(err, GenError::NotFound(_)));
    }

    #[test]
    fn test_paginate_propagates_fetch_errors() {
        let err = paginate(
            |_| {
                Err(GenError::Fetch {
                    url: "https://example.com".to_string(),
                    reason: "connection refused".to_string(),
                })
            },
            &SelectPolicy::Latest,
            &Eligibility::default(),
            "GitHub repository a/b",
        )
        .unwrap_err();

        assert!(matches!(err, GenError::Fetch { .. }));
    }
}
