//! Resolution orchestrator.
//!
//! Composes the providers, selector, version transforms, artifact resolver,
//! and integrity engine into one resolution call per query kind:
//! page fetch -> select (loop) -> version -> artifact URLs -> integrity ->
//! metadata -> result. Every failure is terminal; there are no retries and
//! no partial results. Each invocation is independent and stateless.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::artifact;
use crate::config::{Package, RepoRef, SourceQuery};
use crate::error::Result;
use crate::http::{self, DEFAULT_USER_AGENT};
use crate::integrity::{self, ArtifactDescriptor};
use crate::provider::github::{GithubProvider, PageKind};
use crate::provider::{self, url as url_provider, CandidateEntry, Metadata};
use crate::select::{Eligibility, SelectPolicy};
use crate::transform::{self, Transform};

/// Descriptive metadata exported alongside the resolution, populated only
/// for fields the package metadata does not already define.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Exports {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl Exports {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.license.is_none() && self.homepage.is_none()
    }

    /// Keep only the fields the maintainer has not defined themselves.
    fn from_metadata(metadata: Option<Metadata>, pkg: &Package) -> Self {
        let Some(metadata) = metadata else {
            return Self::default();
        };
        Self {
            description: if pkg.description.is_none() {
                metadata.description
            } else {
                None
            },
            license: if pkg.license.is_none() {
                metadata.license
            } else {
                None
            },
            homepage: if pkg.homepage.is_none() {
                metadata.homepage
            } else {
                None
            },
        }
    }
}

/// The complete result of one resolution.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Resolution {
    pub version: String,
    #[serde(rename = "tarball-urls")]
    pub artifacts: Vec<ArtifactDescriptor>,
    #[serde(skip_serializing_if = "Exports::is_empty")]
    pub exports: Exports,
}

/// Resolve a package's upstream version and verifiable artifacts.
pub fn resolve(pkg: &Package) -> Result<Resolution> {
    match &pkg.query {
        SourceQuery::Commit { repo, pin } => resolve_commit(pkg, repo, pin.as_deref()),
        SourceQuery::Tag {
            repo,
            policy,
            transforms,
        } => resolve_tag(pkg, repo, policy, transforms),
        SourceQuery::Release {
            repo,
            policy,
            transforms,
            eligibility,
            artifacts,
        } => resolve_release(pkg, repo, policy, transforms, *eligibility, artifacts.as_deref()),
        SourceQuery::Url {
            template,
            version,
            transforms,
            hash_locks,
        } => resolve_url(pkg, template, version.as_deref(), transforms, hash_locks),
    }
}

fn resolve_commit(pkg: &Package, repo: &RepoRef, pin: Option<&str>) -> Result<Resolution> {
    let provider = GithubProvider::new(repo, &pkg.headers);
    let candidate = provider.fetch_commit(pin)?;

    // Commit versions come from the committer timestamp, not a name.
    let date = candidate.created_at.as_deref().unwrap_or_default();
    let version = transform::commit_date_version(date)?;

    let artifacts = fetch_all(pkg, &[candidate.archive_url.clone()], &[])?;
    let exports = Exports::from_metadata(provider.fetch_metadata(), pkg);

    Ok(Resolution {
        version,
        artifacts,
        exports,
    })
}

fn resolve_tag(
    pkg: &Package,
    repo: &RepoRef,
    policy: &SelectPolicy,
    transforms: &[Transform],
) -> Result<Resolution> {
    let provider = GithubProvider::new(repo, &pkg.headers);
    let candidate = pick_candidate(&provider, PageKind::Tags, policy, &Eligibility::default(), repo)?;
    let version = transform::apply_transforms(&candidate.name, transforms)?;

    let artifacts = fetch_all(pkg, &[candidate.archive_url.clone()], &[])?;
    let exports = Exports::from_metadata(provider.fetch_metadata(), pkg);

    Ok(Resolution {
        version,
        artifacts,
        exports,
    })
}

fn resolve_release(
    pkg: &Package,
    repo: &RepoRef,
    policy: &SelectPolicy,
    transforms: &[Transform],
    eligibility: Eligibility,
    templates: Option<&[String]>,
) -> Result<Resolution> {
    let provider = GithubProvider::new(repo, &pkg.headers);
    let candidate = pick_candidate(&provider, PageKind::Releases, policy, &eligibility, repo)?;

    // The version is final before any {version} template is expanded.
    let version = transform::apply_transforms(&candidate.name, transforms)?;
    let urls = artifact::release_urls(&candidate, templates, &pkg.name, &version, repo);

    let artifacts = fetch_all(pkg, &urls, &[])?;
    let exports = Exports::from_metadata(provider.fetch_metadata(), pkg);

    Ok(Resolution {
        version,
        artifacts,
        exports,
    })
}

fn resolve_url(
    pkg: &Package,
    template: &str,
    pin: Option<&str>,
    transforms: &[Transform],
    locks: &[String],
) -> Result<Resolution> {
    let (candidate, version) = url_provider::synthesize(template, &pkg.name, pin, transforms)?;
    let artifacts = fetch_all(pkg, &[candidate.archive_url], locks)?;

    Ok(Resolution {
        version,
        artifacts,
        exports: Exports::default(),
    })
}

fn pick_candidate(
    provider: &GithubProvider,
    kind: PageKind,
    policy: &SelectPolicy,
    eligibility: &Eligibility,
    repo: &RepoRef,
) -> Result<CandidateEntry> {
    provider::paginate(
        |page| provider.fetch_page(kind, page),
        policy,
        eligibility,
        &format!("GitHub repository {}", repo.slug()),
    )
}

/// Fetch every resolved URL sequentially, aborting on the first failure.
fn fetch_all(pkg: &Package, urls: &[String], locks: &[String]) -> Result<Vec<ArtifactDescriptor>> {
    let headers = download_headers(&pkg.headers);
    urls.iter()
        .map(|url| integrity::fetch_artifact(url, &headers, locks))
        .collect()
}

fn download_headers(overrides: &BTreeMap<String, String>) -> Vec<(String, String)> {
    http::merge_headers(&[("User-Agent", DEFAULT_USER_AGENT)], overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(description: Option<&str>) -> Package {
        Package {
            name: "foo".to_string(),
            query: SourceQuery::Url {
                template: "https://example.com/a".to_string(),
                version: None,
                transforms: vec![],
                hash_locks: vec![],
            },
            headers: BTreeMap::new(),
            description: description.map(str::to_string),
            license: None,
            homepage: None,
        }
    }

    #[test]
    fn test_exports_never_overwrite_package_metadata() {
        let metadata = Metadata {
            description: Some("from upstream".to_string()),
            license: Some("MIT".to_string()),
            homepage: None,
        };

        let exports = Exports::from_metadata(Some(metadata.clone()), &package(Some("mine")));
        assert_eq!(exports.description, None);
        assert_eq!(exports.license.as_deref(), Some("MIT"));

        let exports = Exports::from_metadata(Some(metadata), &package(None));
        assert_eq!(exports.description.as_deref(), Some("from upstream"));
    }

    #[test]
    fn test_missing_metadata_degrades_to_empty_exports() {
        let exports = Exports::from_metadata(None, &package(None));
        assert!(exports.is_empty());
    }

    #[test]
    fn test_resolution_serialization_shape() {
        let resolution = Resolution {
            version: "1.2.3".to_string(),
            artifacts: vec![],
            exports: Exports::default(),
        };
        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["version"], "1.2.3");
        assert!(json.get("tarball-urls").is_some());
        // Empty exports are omitted entirely.
        assert!(json.get("exports").is_none());

        let resolution = Resolution {
            exports: Exports {
                license: Some("MIT".to_string()),
                ..Exports::default()
            },
            ..resolution
        };
        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["exports"]["license"], "MIT");
        assert!(json["exports"].get("description").is_none());
    }
}
