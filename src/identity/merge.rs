//! Multi-way identity merge execution.
//!
//! The engine validates the selection, picks a target when none is given,
//! issues a single merge request, and reconciles local state afterwards.
//! The backend is the sole authority for atomically reassigning embedding
//! ownership and unioning media links; on any failure nothing is mutated
//! locally and the error is surfaced verbatim. Merges are not idempotent
//! on the backend side and are never retried automatically.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::catalog::{
    CatalogCache, CatalogClient, EmbeddingId, IdentityId, IdentitySummary, MediaId,
};
use crate::error::EngineError;

/// Local state the caller should refresh after a successful merge: the
/// survivor's embedding gallery, and media cards that referenced an
/// absorbed identity (their face badges would otherwise point at a dead
/// id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshHints {
    pub identities: Vec<IdentityId>,
    pub media: Vec<MediaId>,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub survivor: IdentityId,
    pub survivor_name: String,
    pub absorbed: Vec<IdentityId>,
    pub embeddings_moved: usize,
    pub media_links_unioned: usize,
    pub refresh: RefreshHints,
}

/// Merge the selected identities into one survivor.
///
/// `target` may name the survivor explicitly; otherwise the identity with
/// the most linked media absorbs the others, ties broken by lowest id.
/// The selection is revalidated against a fresh catalog listing before the
/// merge is issued: any id that vanished since the candidate list was
/// computed aborts with [`EngineError::StaleSelection`] and no mutation.
pub fn merge_identities(
    client: &dyn CatalogClient,
    cache: &mut CatalogCache,
    selection: &[IdentityId],
    target: Option<IdentityId>,
) -> Result<MergeOutcome, EngineError> {
    let mut ids: Vec<IdentityId> = Vec::with_capacity(selection.len());
    for &id in selection {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.len() < 2 {
        return Err(EngineError::Validation(format!(
            "merge requires at least 2 distinct identities, got {}",
            ids.len()
        )));
    }
    if let Some(t) = target {
        if !ids.contains(&t) {
            return Err(EngineError::Validation(format!(
                "merge target {} is not part of the selection",
                t
            )));
        }
    }

    // Fresh snapshot; the candidate list may predate other clients'
    // mutations.
    let catalog = client.list_catalog()?;
    let by_id: HashMap<IdentityId, &IdentitySummary> =
        catalog.iter().map(|s| (s.id, s)).collect();
    for &id in &ids {
        if !by_id.contains_key(&id) {
            return Err(EngineError::StaleSelection(id));
        }
    }

    let target = target.unwrap_or_else(|| pick_target(&ids, &by_id));
    let sources: Vec<IdentityId> = ids.iter().copied().filter(|&id| id != target).collect();

    // Read-only bookkeeping before the merge: which media referenced the
    // identities about to disappear, and how many links the union adds.
    let mut absorbed_media: BTreeSet<MediaId> = BTreeSet::new();
    for &source in &sources {
        for media_ref in client.get_identity_media(source)? {
            absorbed_media.insert(media_ref.media_id);
        }
    }
    let survivor_media: BTreeSet<MediaId> = client
        .get_identity_media(target)?
        .into_iter()
        .map(|m| m.media_id)
        .collect();
    let media_links_unioned = absorbed_media.difference(&survivor_media).count();
    let embeddings_moved: usize = sources
        .iter()
        .map(|id| by_id[id].embedding_count)
        .sum();

    let mut ordered = Vec::with_capacity(ids.len());
    ordered.push(target);
    ordered.extend(sources.iter().copied());

    let merged = match client.merge_identities(&ordered) {
        Ok(merged) => merged,
        Err(e) => {
            warn!(merge_target = %target, error = %e, "merge request failed; local state untouched");
            return Err(e);
        }
    };

    // Reconcile: absorbed ids leave the listing, the survivor stays and is
    // flagged for refresh along with media that referenced an absorbed id.
    cache.remove_identities(&sources);

    info!(
        survivor = %merged.survivor,
        absorbed = sources.len(),
        embeddings_moved,
        media_links_unioned,
        "identities merged"
    );

    Ok(MergeOutcome {
        survivor: merged.survivor,
        survivor_name: merged.name,
        absorbed: sources,
        embeddings_moved,
        media_links_unioned,
        refresh: RefreshHints {
            identities: vec![merged.survivor],
            media: absorbed_media.into_iter().collect(),
        },
    })
}

fn pick_target(
    ids: &[IdentityId],
    by_id: &HashMap<IdentityId, &IdentitySummary>,
) -> IdentityId {
    // The most "established" identity absorbs the others.
    let mut best = ids[0];
    for &id in &ids[1..] {
        let (count, best_count) = (by_id[&id].linked_media_count, by_id[&best].linked_media_count);
        if count > best_count || (count == best_count && id < best) {
            best = id;
        }
    }
    best
}

/// Delete a single embedding. Deleting the last one does not delete the
/// identity: it persists with zero embeddings until explicitly deleted,
/// and can be shown with a borrowed display embedding in the meantime.
pub fn delete_embedding(
    client: &dyn CatalogClient,
    cache: &mut CatalogCache,
    identity: IdentityId,
    embedding: EmbeddingId,
) -> Result<usize, EngineError> {
    let remaining = client.delete_embedding(identity, embedding)?;
    cache.invalidate();
    if remaining == 0 {
        info!(identity = %identity, "last embedding deleted; identity persists empty");
    }
    Ok(remaining)
}

/// Delete an identity outright, cascading embeddings and media links on
/// the backend.
pub fn delete_identity(
    client: &dyn CatalogClient,
    cache: &mut CatalogCache,
    identity: IdentityId,
) -> Result<(), EngineError> {
    client.delete_identity(identity)?;
    cache.invalidate();
    info!(identity = %identity, "identity deleted");
    Ok(())
}
