//! Syntactic URL canonicalization.
//!
//! Links found in markup come in many shapes: absolute (`https://host/page`),
//! scheme-relative (`//host/page`), host-relative (`/page`), bare domains
//! (`host.com`) and domain-prefixed paths without a scheme (`host.com/page`).
//! [`canonicalize`] turns any of them into an absolute address using only the
//! shape of the string and the address of the page the link was found on.
//! No DNS lookup or fetch is ever performed.

use crate::error::{Result, ScanError};
use url::{ParseError, Position, Url};

/// Extensions that mark a single-segment link as a page or asset living under
/// the parent host rather than as a bare external domain.
pub const KNOWN_EXTENSIONS: [&str; 7] = ["html", "php", "jpg", "jpeg", "png", "css", "js"];

const DEFAULT_SCHEME: &str = "http";

/// Resolve `raw` into an absolute address string relative to `parent`.
///
/// Links that already carry a scheme are returned unchanged. The result of a
/// successful call always carries a scheme, so canonicalizing it again is a
/// no-op.
pub fn canonicalize(raw: &str, parent: &Url) -> Result<String> {
    let raw = raw.trim();

    match Url::parse(raw) {
        Ok(_) => return Ok(raw.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(source) => return Err(ScanError::malformed_url(raw, source)),
    }

    let canonical = match raw.strip_prefix("//") {
        Some(rest) => format!("{}://{}", parent.scheme(), rest),
        None => resolve_schemeless(raw, parent),
    };

    Url::parse(&canonical).map_err(|source| ScanError::malformed_url(raw, source))?;
    Ok(canonical)
}

/// True when `absolute` points at the same host as `parent`.
pub fn is_internal(absolute: &str, parent: &Url) -> Result<bool> {
    let url = Url::parse(absolute).map_err(|source| ScanError::malformed_url(absolute, source))?;
    Ok(url.host_str() == parent.host_str())
}

fn resolve_schemeless(raw: &str, parent: &Url) -> String {
    // Only the path portion takes part in the heuristic; query and fragment
    // ride along untouched.
    let path_end = raw.find(['?', '#']).unwrap_or(raw.len());
    let path = &raw[..path_end];

    let parent_host = parent.host_str().unwrap_or_default();
    let parent_authority = &parent[Position::BeforeHost..Position::AfterPort];

    match path.split_once('/') {
        Some(("", _)) => format!("{}://{}{}", parent.scheme(), parent_authority, raw),
        Some((prefix, _)) if prefix == parent_host || prefix == parent_authority => {
            format!("{}://{}", parent.scheme(), raw)
        }
        Some(_) => format!("{}://{}", DEFAULT_SCHEME, raw),
        None if has_known_extension(path) => {
            format!("{}://{}/{}", parent.scheme(), parent_authority, raw)
        }
        None => format!("{}://{}", DEFAULT_SCHEME, raw),
    }
}

fn has_known_extension(token: &str) -> bool {
    token
        .rsplit_once('.')
        .map(|(_, extension)| {
            KNOWN_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
        .unwrap_or(false)
}
