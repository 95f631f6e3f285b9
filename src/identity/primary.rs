//! Representative-embedding selection.
//!
//! Every identity displays one "primary" embedding as its thumbnail. The
//! heuristic prefers the highest quality capture, ties broken by highest
//! confidence, then lowest embedding id for determinism.

use tracing::info;

use crate::catalog::{CatalogClient, EmbeddingId, FaceEmbedding, IdentityId};
use crate::error::EngineError;

/// Pick the representative embedding from a set, or `None` if empty.
pub fn select_primary(embeddings: &[FaceEmbedding]) -> Option<EmbeddingId> {
    embeddings
        .iter()
        .max_by(|a, b| {
            a.quality
                .total_cmp(&b.quality)
                .then(a.confidence.total_cmp(&b.confidence))
                .then(b.id.cmp(&a.id))
        })
        .map(|e| e.id)
}

/// Re-elect an identity's primary embedding with [`select_primary`] and
/// push the change to the backend if it differs from the current one.
///
/// Returns the elected embedding id, or `None` for an identity with no
/// embeddings (which keeps existing, possibly unset, state).
pub fn elect_primary(
    client: &dyn CatalogClient,
    id: IdentityId,
) -> Result<Option<EmbeddingId>, EngineError> {
    let detail = client.get_identity(id)?;
    let Some(best) = select_primary(&detail.embeddings) else {
        return Ok(None);
    };

    if detail.primary_embedding_id != Some(best) {
        client.set_primary_embedding(id, best)?;
        info!(identity = %id, embedding = %best, "primary embedding updated");
    }
    Ok(Some(best))
}

/// Best-available embedding from elsewhere in the catalog, for displaying
/// an identity that has none of its own. Read-only: the embedding keeps
/// its owner; this is never a transfer.
pub fn borrow_display_embedding(
    client: &dyn CatalogClient,
    id: IdentityId,
) -> Result<Option<FaceEmbedding>, EngineError> {
    let catalog = client.list_catalog()?;
    let mut best: Option<FaceEmbedding> = None;

    for summary in catalog {
        if summary.id == id || summary.embedding_count == 0 {
            continue;
        }
        let detail = client.get_identity(summary.id)?;
        for embedding in detail.embeddings {
            let better = match &best {
                None => true,
                Some(current) => embedding
                    .quality
                    .total_cmp(&current.quality)
                    .then(embedding.confidence.total_cmp(&current.confidence))
                    .then(current.id.cmp(&embedding.id))
                    .is_gt(),
            };
            if better {
                best = Some(embedding);
            }
        }
    }

    Ok(best)
}
