//! Package metadata parsing and validation.
//!
//! A package is described by a JSON document naming the package and exactly
//! one source query (`github` or `url-generator`). The untyped document is
//! deserialized into raw structs and validated into a typed [`SourceQuery`]
//! up front; illegal field combinations fail here, never mid-resolution.
//!
//! ## Example
//!
//! ```json
//! {
//!     "name": "ripgrep",
//!     "github": {
//!         "user": "BurntSushi",
//!         "repo": "ripgrep",
//!         "query": "release",
//!         "select": "^\\d+\\.\\d+\\.\\d+$",
//!         "artifacts": ["{pkgname}-{version}-x86_64-unknown-linux-musl.tar.gz"]
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Deserializer};

use crate::error::{GenError, Result};
use crate::select::{Eligibility, SelectPolicy};
use crate::transform::Transform;

/// Default GitHub web host
const DEFAULT_DOMAIN: &str = "github.com";

/// Default GitHub API host
const DEFAULT_API_DOMAIN: &str = "api.github.com";

/// A GitHub repository reference, with optional enterprise host overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub user: String,
    pub repo: String,
    pub domain: String,
    pub api_domain: String,
}

impl RepoRef {
    /// Base URL of the API host. A domain carrying an explicit scheme is
    /// used verbatim; otherwise `https://` is assumed.
    pub fn api_base(&self) -> String {
        base_for(&self.api_domain)
    }

    /// Base URL of the web host (archive downloads).
    pub fn web_base(&self) -> String {
        base_for(&self.domain)
    }

    /// `user/repo`, for error messages.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.user, self.repo)
    }
}

fn base_for(domain: &str) -> String {
    if domain.contains("://") {
        domain.trim_end_matches('/').to_string()
    } else {
        format!("https://{domain}")
    }
}

/// One validated source query. Exactly one kind per invocation.
#[derive(Debug, Clone)]
pub enum SourceQuery {
    Commit {
        repo: RepoRef,
        pin: Option<String>,
    },
    Tag {
        repo: RepoRef,
        policy: SelectPolicy,
        transforms: Vec<Transform>,
    },
    Release {
        repo: RepoRef,
        policy: SelectPolicy,
        transforms: Vec<Transform>,
        eligibility: Eligibility,
        artifacts: Option<Vec<String>>,
    },
    Url {
        template: String,
        version: Option<String>,
        transforms: Vec<Transform>,
        hash_locks: Vec<String>,
    },
}

/// A fully validated package description.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub query: SourceQuery,
    /// Caller-supplied HTTP headers, merged over the defaults per request.
    pub headers: BTreeMap<String, String>,
    /// Metadata already defined by the maintainer; matching export fields
    /// are never overwritten.
    pub description: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
}

impl Package {
    /// Parse and validate a package metadata document.
    pub fn from_json(document: &str) -> Result<Self> {
        let raw: RawPackage = serde_json::from_str(document)
            .map_err(|e| GenError::Config(format!("cannot parse package metadata: {e}")))?;
        raw.validate()
    }

    /// Parse and validate a package metadata document from a reader.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut document = String::new();
        reader
            .read_to_string(&mut document)
            .map_err(|e| GenError::Config(format!("cannot read package metadata: {e}")))?;
        Self::from_json(&document)
    }
}

// ============================================================================
// Raw (untyped) document model
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    description: Option<String>,
    license: Option<String>,
    homepage: Option<String>,
    github: Option<RawGithub>,
    #[serde(rename = "url-generator")]
    url_generator: Option<RawUrl>,
}

#[derive(Debug, Deserialize)]
struct RawGithub {
    user: Option<String>,
    repo: Option<String>,
    query: Option<String>,
    select: Option<String>,
    transforms: Option<Vec<Vec<String>>>,
    artifacts: Option<Vec<String>>,
    version: Option<String>,
    #[serde(rename = "include-drafts", default, deserialize_with = "de_flag")]
    include_drafts: bool,
    #[serde(rename = "include-pre-releases", default, deserialize_with = "de_flag")]
    include_pre_releases: bool,
    domain: Option<String>,
    #[serde(rename = "api-domain")]
    api_domain: Option<String>,
    headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawUrl {
    url: Option<String>,
    version: Option<String>,
    transforms: Option<Vec<Vec<String>>>,
    #[serde(rename = "hash-locks")]
    hash_locks: Option<Vec<String>>,
    headers: Option<BTreeMap<String, String>>,
}

/// Accept a JSON bool or the strings "true"/"false". Existing package
/// documents use string toggles.
fn de_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"true\" or \"false\", got \"{other}\""
            ))),
        },
    }
}

// ============================================================================
// Validation
// ============================================================================

impl RawPackage {
    fn validate(self) -> Result<Package> {
        let name = self.name;
        if name.is_empty() {
            return Err(GenError::Config("package \"name\" must not be empty".into()));
        }

        let (query, headers) = match (self.github, self.url_generator) {
            (Some(github), None) => github.validate(&name)?,
            (None, Some(url)) => url.validate(&name)?,
            (Some(_), Some(_)) => {
                return Err(GenError::Config(format!(
                    "package \"{name}\" defines both \"github\" and \"url-generator\"; \
                     exactly one source is allowed"
                )));
            }
            (None, None) => {
                return Err(GenError::Config(format!(
                    "no object named \"github\" or \"url-generator\" found inside the \
                     \"{name}\" package's metadata"
                )));
            }
        };

        Ok(Package {
            name,
            query,
            headers,
            description: self.description,
            license: self.license,
            homepage: self.homepage,
        })
    }
}

impl RawGithub {
    fn validate(self, name: &str) -> Result<(SourceQuery, BTreeMap<String, String>)> {
        let user = self
            .user
            .ok_or_else(|| GenError::Config(format!("no GitHub user provided for \"{name}\"")))?;
        let repo = self
            .repo
            .ok_or_else(|| GenError::Config(format!("no GitHub repo provided for \"{name}\"")))?;
        let query = self
            .query
            .ok_or_else(|| GenError::Config(format!("no GitHub query provided for \"{name}\"")))?;

        let repo_ref = RepoRef {
            user,
            repo,
            domain: self.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            api_domain: self
                .api_domain
                .unwrap_or_else(|| DEFAULT_API_DOMAIN.to_string()),
        };
        let headers = self.headers.unwrap_or_default();

        let query = match query.as_str() {
            "commit" | "commits" => {
                reject_key(name, "select", self.select.is_some())?;
                reject_key(name, "transforms", self.transforms.is_some())?;
                reject_key(name, "artifacts", self.artifacts.is_some())?;
                SourceQuery::Commit {
                    repo: repo_ref,
                    pin: self.version,
                }
            }
            "tag" | "tags" => {
                reject_key(name, "artifacts", self.artifacts.is_some())?;
                SourceQuery::Tag {
                    repo: repo_ref,
                    policy: SelectPolicy::from_options(
                        self.select.as_deref(),
                        self.version.as_deref(),
                        name,
                    )?,
                    transforms: parse_transforms(self.transforms, name)?,
                }
            }
            "release" | "releases" => SourceQuery::Release {
                repo: repo_ref,
                policy: SelectPolicy::from_options(
                    self.select.as_deref(),
                    self.version.as_deref(),
                    name,
                )?,
                transforms: parse_transforms(self.transforms, name)?,
                eligibility: Eligibility {
                    include_drafts: self.include_drafts,
                    include_pre_releases: self.include_pre_releases,
                },
                artifacts: self.artifacts,
            },
            other => {
                return Err(GenError::Config(format!(
                    "invalid GitHub query \"{other}\" for \"{name}\"; the query field can only \
                     be set to one of the following: \"release\", \"tag\" or \"commit\""
                )));
            }
        };

        Ok((query, headers))
    }
}

impl RawUrl {
    fn validate(self, name: &str) -> Result<(SourceQuery, BTreeMap<String, String>)> {
        let template = self.url.ok_or_else(|| {
            GenError::Config(format!(
                "no string entry named \"url\" found inside the \"{name}\" package's metadata"
            ))
        })?;

        if self.version.is_some() && self.transforms.is_some() {
            return Err(GenError::Config(format!(
                "cannot have both a \"version\" and a \"transforms\" key for \"{name}\""
            )));
        }
        if template.contains("{version}") && self.version.is_none() {
            return Err(GenError::Config(format!(
                "the URL for \"{name}\" references {{version}} but no \"version\" key is set"
            )));
        }

        // Lock matching is case-insensitive over hex strings.
        let hash_locks = self
            .hash_locks
            .unwrap_or_default()
            .into_iter()
            .map(|lock| lock.to_lowercase())
            .collect();

        Ok((
            SourceQuery::Url {
                template,
                version: self.version,
                transforms: parse_transforms(self.transforms, name)?,
                hash_locks,
            },
            self.headers.unwrap_or_default(),
        ))
    }
}

fn reject_key(name: &str, key: &str, present: bool) -> Result<()> {
    if present {
        return Err(GenError::Config(format!(
            "the \"{key}\" key is not valid for this query kind (package \"{name}\")"
        )));
    }
    Ok(())
}

fn parse_transforms(raw: Option<Vec<Vec<String>>>, name: &str) -> Result<Vec<Transform>> {
    let Some(raw) = raw else {
        return Ok(vec![]);
    };
    raw.into_iter()
        .map(|pair| {
            let [pattern, replacement]: [String; 2] = pair.try_into().map_err(|_| {
                GenError::Config(format!(
                    "elements of the transforms array must be arrays with 2 elements \
                     (package \"{name}\")"
                ))
            })?;
            // Fail on unparsable patterns before any page is fetched.
            regex::Regex::new(&pattern).map_err(|e| {
                GenError::Config(format!(
                    "bad transform pattern \"{pattern}\" for \"{name}\": {e}"
                ))
            })?;
            Ok(Transform::new(pattern, replacement))
        })
        .collect()
}
