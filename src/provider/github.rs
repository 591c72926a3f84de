//! GitHub source adapter.
//!
//! Fetches candidate pages from the tags, releases, and commits endpoints of
//! the GitHub REST API (v2022-11-28), plus repository metadata. Enterprise
//! instances are reached through the `domain`/`api-domain` overrides on the
//! repository reference.

use serde::Deserialize;

use crate::config::RepoRef;
use crate::error::{GenError, Result};
use crate::http;
use crate::provider::{AssetRef, CandidateEntry, Metadata, PAGE_SIZE};

/// Which paginated listing to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Tags,
    Releases,
}

impl PageKind {
    fn path(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Releases => "releases",
        }
    }
}

/// A GitHub provider bound to one repository, carrying the merged request
/// headers for every call it makes.
#[derive(Debug, Clone)]
pub struct GithubProvider {
    repo: RepoRef,
    headers: Vec<(String, String)>,
}

impl GithubProvider {
    pub fn new(repo: &RepoRef, overrides: &std::collections::BTreeMap<String, String>) -> Self {
        let defaults = [
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", "2022-11-28"),
            ("User-Agent", "pkggen"),
        ];
        Self {
            repo: repo.clone(),
            headers: http::merge_headers(&defaults, overrides),
        }
    }

    /// Fetch one fixed-size page of tags or releases, ascending from page 1.
    ///
    /// A non-2xx response is a not-found condition for the repository, not a
    /// transport failure.
    pub fn fetch_page(&self, kind: PageKind, page: u32) -> Result<Vec<CandidateEntry>> {
        let url = format!(
            "{}/repos/{}/{}?page={page}&per_page={PAGE_SIZE}",
            self.repo.api_base(),
            self.repo.slug(),
            kind.path(),
        );
        let response = self.call(&url)?;

        match kind {
            PageKind::Tags => {
                let tags: Vec<ApiTag> = json_body(response, &url)?;
                Ok(tags.into_iter().map(ApiTag::into_candidate).collect())
            }
            PageKind::Releases => {
                let releases: Vec<ApiRelease> = json_body(response, &url)?;
                Ok(releases
                    .into_iter()
                    .map(ApiRelease::into_candidate)
                    .collect())
            }
        }
    }

    /// Fetch the pinned commit, or the most recent one when no pin is given.
    /// Commit queries always yield a page of size one.
    pub fn fetch_commit(&self, pin: Option<&str>) -> Result<CandidateEntry> {
        let api_base = self.repo.api_base();
        let slug = self.repo.slug();

        let commit: ApiCommit = match pin {
            Some(sha) => {
                let url = format!("{api_base}/repos/{slug}/commits/{sha}");
                json_body(self.call(&url)?, &url)?
            }
            None => {
                let url = format!("{api_base}/repos/{slug}/commits");
                let mut commits: Vec<ApiCommit> = json_body(self.call(&url)?, &url)?;
                if commits.is_empty() {
                    return Err(self.not_found());
                }
                commits.swap_remove(0)
            }
        };

        let archive_url = format!(
            "{}/{slug}/archive/{}.tar.gz",
            self.repo.web_base(),
            commit.sha
        );
        Ok(CandidateEntry {
            name: commit.sha.clone(),
            id: commit.sha,
            created_at: Some(commit.commit.committer.date),
            draft: false,
            prerelease: false,
            archive_url,
            assets: vec![],
        })
    }

    /// Fetch descriptive repository metadata. Failure here is non-fatal and
    /// degrades to `None`; the resolution result simply omits the exports.
    pub fn fetch_metadata(&self) -> Option<Metadata> {
        let url = format!("{}/repos/{}", self.repo.api_base(), self.repo.slug());
        let response = http::get(&url, &self.headers).call().ok()?;
        let repo: ApiRepo = response.into_json().ok()?;

        Some(Metadata {
            description: non_empty(repo.description),
            license: non_empty(repo.license.and_then(|l| l.spdx_id)),
            homepage: non_empty(repo.homepage),
        })
    }

    fn call(&self, url: &str) -> Result<ureq::Response> {
        http::get(url, &self.headers).call().map_err(|e| match e {
            ureq::Error::Status(_, _) => self.not_found(),
            other => GenError::Fetch {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })
    }

    fn not_found(&self) -> GenError {
        GenError::NotFound(format!(
            "unable to find a compatible version or the URL is invalid for GitHub repository {}",
            self.repo.slug()
        ))
    }
}

fn json_body<T: serde::de::DeserializeOwned>(response: ureq::Response, url: &str) -> Result<T> {
    response.into_json().map_err(|e| GenError::Fetch {
        url: url.to_string(),
        reason: format!("invalid API response: {e}"),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// ============================================================================
// API response model
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiTag {
    name: String,
    tarball_url: String,
}

impl ApiTag {
    fn into_candidate(self) -> CandidateEntry {
        CandidateEntry {
            id: self.name.clone(),
            name: self.name,
            created_at: None,
            draft: false,
            prerelease: false,
            archive_url: self.tarball_url,
            assets: vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    // Release names may be null; fall back to the tag name.
    name: Option<String>,
    tag_name: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
    tarball_url: String,
    created_at: Option<String>,
    #[serde(default)]
    assets: Vec<ApiAsset>,
}

impl ApiRelease {
    fn into_candidate(self) -> CandidateEntry {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or(self.tag_name)
            .unwrap_or_default();
        CandidateEntry {
            id: name.clone(),
            name,
            created_at: self.created_at,
            draft: self.draft,
            prerelease: self.prerelease,
            archive_url: self.tarball_url,
            assets: self
                .assets
                .into_iter()
                .map(|a| AssetRef {
                    name: a.name,
                    download_url: a.browser_download_url,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiAsset {
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetails,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetails {
    committer: ApiCommitter,
}

#[derive(Debug, Deserialize)]
struct ApiCommitter {
    date: String,
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    description: Option<String>,
    license: Option<ApiLicense>,
    homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLicense {
    spdx_id: Option<String>,
}
