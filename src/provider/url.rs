//! Plain-URL source adapter.
//!
//! A URL query has no remote listing to page through; it synthesizes a
//! single candidate from the templated URL. The version is the explicit pin
//! when one is given, otherwise the transform pipeline applied to the
//! expanded URL, otherwise the expanded URL itself.

use crate::error::Result;
use crate::provider::CandidateEntry;
use crate::transform::{self, Transform};

/// Expand the `{pkgname}` and `{version}` placeholders of a URL template.
pub fn expand(template: &str, pkgname: &str, version: Option<&str>) -> String {
    let expanded = template.replace("{pkgname}", pkgname);
    match version {
        Some(version) => expanded.replace("{version}", version),
        None => expanded,
    }
}

/// Synthesize the single candidate of a URL query along with its resolved
/// version. The version is resolved before `{version}` is expanded.
pub fn synthesize(
    template: &str,
    pkgname: &str,
    pin: Option<&str>,
    transforms: &[Transform],
) -> Result<(CandidateEntry, String)> {
    let base = expand(template, pkgname, None);
    let version = match pin {
        Some(pin) => pin.to_string(),
        None => transform::apply_transforms(&base, transforms)?,
    };
    let url = expand(template, pkgname, Some(&version));

    let candidate = CandidateEntry {
        name: url.clone(),
        id: url.clone(),
        created_at: None,
        draft: false,
        prerelease: false,
        archive_url: url,
        assets: vec![],
    };
    Ok((candidate, version))
}
