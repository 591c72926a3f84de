//! Artifact URL resolution.
//!
//! A release candidate may attach named downloadable assets. Maintainers
//! select them with templated filenames; each expanded template that exactly
//! equals an asset name contributes that asset's download URL. The
//! candidate's source archive always comes first.

use crate::config::RepoRef;
use crate::provider::CandidateEntry;

/// Expand the placeholders of one artifact template.
///
/// Accepted parameters: `{pkgname}`, `{version}`, `{github_user}`,
/// `{github_repo}`.
pub fn expand_template(
    template: &str,
    pkgname: &str,
    version: &str,
    repo: &RepoRef,
) -> String {
    template
        .replace("{pkgname}", pkgname)
        .replace("{version}", version)
        .replace("{github_user}", &repo.user)
        .replace("{github_repo}", &repo.repo)
}

/// Resolve the ordered download URL list for a release candidate.
///
/// Without templates the list is just the archive URL. With templates, every
/// expanded name that exactly matches an asset appends that asset's URL, in
/// template order; unmatched templates are silently skipped.
pub fn release_urls(
    candidate: &CandidateEntry,
    templates: Option<&[String]>,
    pkgname: &str,
    version: &str,
    repo: &RepoRef,
) -> Vec<String> {
    let mut urls = vec![candidate.archive_url.clone()];
    let Some(templates) = templates else {
        return urls;
    };

    for template in templates {
        let wanted = expand_template(template, pkgname, version, repo);
        if let Some(asset) = candidate.assets.iter().find(|a| a.name == wanted) {
            urls.push(asset.download_url.clone());
        }
    }
    urls
}
