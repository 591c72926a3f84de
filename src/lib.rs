//! Upstream version resolution and artifact checksum generation for package
//! pipelines.
//!
//! Given a package metadata document naming a source — a GitHub repository's
//! tags, releases, or commits, or an arbitrary templated URL — pkggen
//! resolves the current upstream version and produces verifiable artifacts:
//! download URL, declared size, and a twelve-algorithm checksum battery per
//! artifact, optionally enforced against a hash-lock allow-list.
//!
//! # Example
//!
//! ```no_run
//! let pkg = pkggen::Package::from_json(r#"{
//!     "name": "ripgrep",
//!     "github": {
//!         "user": "BurntSushi",
//!         "repo": "ripgrep",
//!         "query": "release",
//!         "select": "^\\d+\\.\\d+\\.\\d+$"
//!     }
//! }"#)?;
//! let resolution = pkggen::resolve(&pkg)?;
//! println!("{}", serde_json::to_string(&resolution)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Resolution is synchronous and stateless: every call performs a full
//! fresh lookup, blocks on each network request, and fetches artifacts
//! strictly one at a time.

pub mod artifact;
pub mod config;
pub mod error;
pub mod http;
pub mod integrity;
pub mod output;
pub mod provider;
pub mod resolve;
pub mod select;
pub mod transform;

pub use config::{Package, RepoRef, SourceQuery};
pub use error::{GenError, Result};
pub use integrity::{ArtifactDescriptor, ChecksumSet};
pub use resolve::{resolve, Exports, Resolution};
