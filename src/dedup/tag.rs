//! Deterministic group tag naming.
//!
//! A duplicate-media group is not a first-class entity; it is a tag whose
//! name is derived from the exact member set. Recomputing the name from
//! the same members always yields the same string, so "is this group
//! already tagged" reduces to name equality. The name depends on nothing
//! but the member ids: not input order, not wall-clock time.

use sha2::{Digest, Sha256};

use crate::catalog::MediaId;

/// Sorted, deduplicated member ids: the canonical form the tag name is
/// derived from.
pub fn canonical_members(ids: &[MediaId]) -> Vec<MediaId> {
    let mut members = ids.to_vec();
    members.sort_unstable();
    members.dedup();
    members
}

/// Derive the group tag name: `prefix` followed by the first `width` hex
/// characters of the SHA-256 of the canonical comma-joined id list.
pub fn dedup_tag_name(prefix: &str, width: usize, ids: &[MediaId]) -> String {
    let canonical = canonical_members(ids)
        .iter()
        .map(|m| m.0.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let digest = Sha256::digest(canonical.as_bytes());
    let hex = format!("{:x}", digest);
    let width = width.min(hex.len());
    format!("{}{}", prefix, &hex[..width])
}

/// Whether a tag name belongs to the dedup namespace.
pub fn is_dedup_tag(prefix: &str, name: &str) -> bool {
    !prefix.is_empty() && name.starts_with(prefix)
}
