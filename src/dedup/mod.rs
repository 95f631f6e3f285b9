//! Duplicate-media group tagging.
//!
//! Media items flagged as near-identical by the external fingerprinting
//! service are grouped by writing a deterministically-named tag onto every
//! member (see [`tag`]). When a tagging action discovers members already
//! carrying a different dedup tag, the groups are merged: membership
//! follows existing tags transitively, the tag is recomputed over the
//! union, and old tags left with zero members are deleted.

pub mod tag;

pub use tag::{canonical_members, dedup_tag_name, is_dedup_tag};

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::catalog::{CatalogCache, CatalogClient, MediaId, TagRef};
use crate::config::DedupTagConfig;
use crate::error::EngineError;

/// Result of one tagging action. Apply/remove failures are collected
/// per item rather than aborting: partial tagging is still useful, and
/// re-running the same action fixes the stragglers.
#[derive(Debug, Clone)]
pub struct TagOutcome {
    /// The tag every member of the (possibly merged) group now carries.
    pub tag: String,
    /// Final group membership, sorted.
    pub members: Vec<MediaId>,
    /// Tags newly applied.
    pub applied: usize,
    /// Members that already carried the tag.
    pub already_tagged: usize,
    /// Per-item failures, with the backend's message.
    pub failed: Vec<(MediaId, String)>,
    /// Old group tags that were emptied and deleted.
    pub retired_tags: Vec<String>,
    /// Pre-existing groups folded into this one.
    pub merged_groups: usize,
}

impl TagOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Convert a mixed outcome into [`EngineError::PartialFailure`],
    /// passing a clean outcome through.
    pub fn into_result(self) -> Result<TagOutcome, EngineError> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(EngineError::PartialFailure {
                applied: self.applied,
                failed: self.failed,
            })
        }
    }
}

/// Tag a set of near-identical media items as one duplicate group.
///
/// Fresh group: every member gets the tag computed from the input set
/// (applying an already-present tag is a no-op). Group-merge: if any
/// member carries a different dedup tag, the member set is unioned with
/// every carrier of every such tag (transitively, so membership follows
/// existing tags beyond the immediate input), the tag is recomputed over
/// the union, and emptied old tags are deleted.
///
/// Reads that establish membership abort on failure (nothing has been
/// mutated yet); apply/remove failures afterwards are collected into the
/// outcome.
pub fn tag_duplicate_group(
    client: &dyn CatalogClient,
    cache: &mut CatalogCache,
    config: &DedupTagConfig,
    media: &[MediaId],
) -> Result<TagOutcome, EngineError> {
    let input = canonical_members(media);
    if input.len() < 2 {
        return Err(EngineError::Validation(format!(
            "a duplicate group needs at least 2 distinct media items, got {}",
            input.len()
        )));
    }

    // Discovery: walk membership outward through existing dedup tags
    // until it stops growing.
    let mut tags_by_media: BTreeMap<MediaId, Vec<TagRef>> = BTreeMap::new();
    let mut seen_tags: BTreeMap<String, TagRef> = BTreeMap::new();
    let mut queue: Vec<MediaId> = input.clone();

    while let Some(item) = queue.pop() {
        if tags_by_media.contains_key(&item) {
            continue;
        }
        let tags = client.get_media_tags(item)?;
        for tag_ref in &tags {
            if !is_dedup_tag(&config.prefix, &tag_ref.name)
                || seen_tags.contains_key(&tag_ref.name)
            {
                continue;
            }
            seen_tags.insert(tag_ref.name.clone(), tag_ref.clone());
            for carrier in client.get_tag_media(&tag_ref.name)? {
                if !tags_by_media.contains_key(&carrier) && !queue.contains(&carrier) {
                    queue.push(carrier);
                }
            }
        }
        tags_by_media.insert(item, tags);
    }

    let members: Vec<MediaId> = tags_by_media.keys().copied().collect();
    let final_tag = dedup_tag_name(&config.prefix, config.hash_width, &members);
    let old_tags: Vec<&TagRef> = seen_tags
        .iter()
        .filter(|(name, _)| **name != final_tag)
        .map(|(_, tag_ref)| tag_ref)
        .collect();
    let merged_groups = old_tags.len();

    // Mutation, best-effort per item from here on.
    let mut applied = 0;
    let mut already_tagged = 0;
    let mut failed: Vec<(MediaId, String)> = Vec::new();

    for &member in &members {
        if tags_by_media[&member].iter().any(|t| t.name == final_tag) {
            already_tagged += 1;
            continue;
        }
        match client.apply_tag(member, &final_tag) {
            Ok(()) => applied += 1,
            Err(e) => failed.push((member, e.to_string())),
        }
    }

    let mut retired_tags = Vec::new();
    for old in old_tags {
        let mut fully_removed = true;
        for (&member, tags) in &tags_by_media {
            if !tags.iter().any(|t| t.id == old.id) {
                continue;
            }
            if let Err(e) = client.remove_tag(member, old.id) {
                fully_removed = false;
                failed.push((member, e.to_string()));
            }
        }
        if fully_removed {
            match client.delete_tag(old.id) {
                Ok(()) => retired_tags.push(old.name.clone()),
                Err(e) => warn!(tag = %old.name, error = %e, "emptied tag not deleted"),
            }
        }
    }

    cache.invalidate();

    info!(
        tag = %final_tag,
        members = members.len(),
        applied,
        already_tagged,
        failures = failed.len(),
        merged_groups,
        "duplicate group tagged"
    );

    Ok(TagOutcome {
        tag: final_tag,
        members,
        applied,
        already_tagged,
        failed,
        retired_tags,
        merged_groups,
    })
}
