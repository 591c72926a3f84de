//! Artifact download and integrity verification.
//!
//! Every resolved artifact is streamed into memory and digested with a
//! fixed battery of twelve checksum algorithms. When a hash-lock set is
//! configured, at least one computed digest must be on the allow-list or
//! the whole resolution fails. Peak memory is proportional to the largest
//! single artifact; artifacts are fetched one at a time.

use std::io::Read;

use blake2::{Blake2b512, Blake2s256};
use md5::Md5;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::error::{GenError, Result};
use crate::{http, output};

/// Chunk size for streaming downloads (64 KiB)
const CHUNK_SIZE: usize = 64 * 1024;

/// The fixed digest battery computed for every artifact, keyed the way the
/// output document spells the algorithms.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChecksumSet {
    pub md5: String,
    pub sha1: String,
    #[serde(rename = "sha2-224")]
    pub sha2_224: String,
    #[serde(rename = "sha3-224")]
    pub sha3_224: String,
    #[serde(rename = "sha2-256")]
    pub sha2_256: String,
    #[serde(rename = "sha3-256")]
    pub sha3_256: String,
    #[serde(rename = "sha2-384")]
    pub sha2_384: String,
    #[serde(rename = "sha3-384")]
    pub sha3_384: String,
    #[serde(rename = "sha2-512")]
    pub sha2_512: String,
    #[serde(rename = "sha3-512")]
    pub sha3_512: String,
    pub blake2s: String,
    pub blake2b: String,
}

fn hex_digest<D: Digest>(data: &[u8]) -> String {
    hex::encode(D::digest(data))
}

impl ChecksumSet {
    /// Digest the complete byte content of an artifact.
    pub fn compute(data: &[u8]) -> Self {
        Self {
            md5: hex_digest::<Md5>(data),
            sha1: hex_digest::<Sha1>(data),
            sha2_224: hex_digest::<Sha224>(data),
            sha3_224: hex_digest::<Sha3_224>(data),
            sha2_256: hex_digest::<Sha256>(data),
            sha3_256: hex_digest::<Sha3_256>(data),
            sha2_384: hex_digest::<Sha384>(data),
            sha3_384: hex_digest::<Sha3_384>(data),
            sha2_512: hex_digest::<Sha512>(data),
            sha3_512: hex_digest::<Sha3_512>(data),
            blake2s: hex_digest::<Blake2s256>(data),
            blake2b: hex_digest::<Blake2b512>(data),
        }
    }

    /// All digests with their output keys.
    pub fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("md5", &self.md5),
            ("sha1", &self.sha1),
            ("sha2-224", &self.sha2_224),
            ("sha3-224", &self.sha3_224),
            ("sha2-256", &self.sha2_256),
            ("sha3-256", &self.sha3_256),
            ("sha2-384", &self.sha2_384),
            ("sha3-384", &self.sha3_384),
            ("sha2-512", &self.sha2_512),
            ("sha3-512", &self.sha3_512),
            ("blake2s", &self.blake2s),
            ("blake2b", &self.blake2b),
        ]
    }

    /// Whether any digest is a member of the lock set. Lock strings are
    /// matched algorithm-agnostically and case-insensitively.
    pub fn matches_any(&self, locks: &[String]) -> bool {
        self.entries()
            .iter()
            .any(|(_, digest)| locks.iter().any(|lock| lock.eq_ignore_ascii_case(digest)))
    }
}

/// One verifiable downloadable artifact.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    pub url: String,
    /// Upstream-declared content length, omitted when absent or zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub checksums: ChecksumSet,
}

/// Download one artifact and digest it.
///
/// A non-2xx response or transport failure aborts the resolution. The
/// reported size is the declared content length (when nonzero), not the
/// byte count actually read, so chunked transfers still carry the
/// upstream-declared size. A non-empty lock set must intersect the computed
/// digests.
pub fn fetch_artifact(
    url: &str,
    headers: &[(String, String)],
    locks: &[String],
) -> Result<ArtifactDescriptor> {
    let data = download_to_buffer(url, headers)?;
    let checksums = ChecksumSet::compute(&data.bytes);

    if !locks.is_empty() && !checksums.matches_any(locks) {
        return Err(GenError::LockMismatch {
            url: url.to_string(),
        });
    }

    Ok(ArtifactDescriptor {
        url: url.to_string(),
        size: data.declared_size,
        checksums,
    })
}

struct Download {
    bytes: Vec<u8>,
    declared_size: Option<u64>,
}

fn download_to_buffer(url: &str, headers: &[(String, String)]) -> Result<Download> {
    let pb = output::download_progress(&format!("downloading {url}"));

    let response = http::get(url, headers).call().map_err(|e| {
        pb.finish_and_clear();
        match e {
            ureq::Error::Status(code, _) => GenError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP status {code}"),
            },
            other => GenError::Fetch {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    })?;

    let declared_size = response
        .header("content-length")
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|len| *len > 0);
    if let Some(len) = declared_size {
        output::upgrade_to_bytes(&pb, len);
    }

    let mut reader = response.into_reader();
    let mut bytes = Vec::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer).map_err(|e| {
            pb.finish_and_clear();
            GenError::Fetch {
                url: url.to_string(),
                reason: format!("read error: {e}"),
            }
        })?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&buffer[..n]);
        total += n as u64;
        pb.set_position(total);
    }

    pb.finish_and_clear();
    output::detail(&format!("downloaded {url} ({total} bytes)"));

    Ok(Download {
        bytes,
        declared_size,
    })
}
