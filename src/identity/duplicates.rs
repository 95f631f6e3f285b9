//! Near-duplicate detection within one identity's embeddings.
//!
//! Surfaces redundant captures (the same frame scanned twice) so they can
//! be safely deleted. Uses cheap proxy signals instead of recomputing
//! vector similarity for every pair: two embeddings whose confidence and
//! quality scores both lie within a small epsilon are treated as the same
//! capture. Deliberately conservative to avoid false merges.

use crate::catalog::{EmbeddingId, FaceEmbedding};

/// A group of near-identical captures. The first-seen embedding is kept as
/// the original; the rest are candidates for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCluster {
    pub original: EmbeddingId,
    pub duplicates: Vec<EmbeddingId>,
}

/// Greedy first-seen-wins clustering over one identity's embeddings.
///
/// Iterates in the given order; each unassigned embedding seeds a cluster
/// and claims every later unassigned embedding within both epsilons.
/// Singleton clusters are dropped. Which member counts as "the original"
/// is purely iteration order, a documented policy choice rather than an
/// optimality claim.
///
/// Purely local: no network calls, deterministic for a fixed input.
pub fn find_duplicate_embeddings(
    embeddings: &[FaceEmbedding],
    confidence_eps: f32,
    quality_eps: f32,
) -> Vec<DuplicateCluster> {
    if embeddings.len() <= 1 {
        return Vec::new();
    }

    let mut claimed = vec![false; embeddings.len()];
    let mut clusters = Vec::new();

    for i in 0..embeddings.len() {
        if claimed[i] {
            continue;
        }
        claimed[i] = true;
        let seed = &embeddings[i];
        let mut duplicates = Vec::new();

        for j in (i + 1)..embeddings.len() {
            if claimed[j] {
                continue;
            }
            let other = &embeddings[j];
            if (seed.confidence - other.confidence).abs() <= confidence_eps
                && (seed.quality - other.quality).abs() <= quality_eps
            {
                claimed[j] = true;
                duplicates.push(other.id);
            }
        }

        if !duplicates.is_empty() {
            clusters.push(DuplicateCluster {
                original: seed.id,
                duplicates,
            });
        }
    }

    clusters
}
