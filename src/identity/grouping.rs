//! Catalog-wide grouping of identities by primary-embedding similarity.
//!
//! The backend owns the vectors and the comparison primitive; this module
//! requests pairwise similarity, partitions the catalog with the same
//! greedy seed-based strategy as duplicate detection, and ranks the
//! resulting candidate merge groups. Groups are snapshots: stateless,
//! recomputed from the current catalog on every call, never cached across
//! mutations.

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::{CatalogClient, IdentityId};
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub identity: IdentityId,
    /// Similarity to the group's seed; 1.0 for the seed itself.
    pub similarity_to_seed: f32,
}

/// A candidate merge group. Ephemeral; must be revalidated against the
/// catalog before acting on it (ids can go stale).
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityGroup {
    pub seed: IdentityId,
    pub members: Vec<GroupMember>,
    pub threshold: f32,
}

impl SimilarityGroup {
    pub fn member_ids(&self) -> Vec<IdentityId> {
        self.members.iter().map(|m| m.identity).collect()
    }
}

/// Group all catalog identities whose pairwise similarity to a seed meets
/// `threshold`.
///
/// Greedy partition in catalog order: the first unclaimed identity seeds a
/// group and claims every later unclaimed identity at or above the
/// threshold, so no identity appears in more than one group. Singleton
/// groups are dropped. Groups are sorted by descending member count so the
/// largest consolidation opportunities come first, ties by lowest seed id.
pub fn group_by_similarity(
    client: &dyn CatalogClient,
    threshold: f32,
) -> Result<Vec<SimilarityGroup>, EngineError> {
    if !(0.0..1.0).contains(&threshold) || threshold <= 0.0 {
        return Err(EngineError::Validation(format!(
            "similarity threshold must be in (0, 1), got {}",
            threshold
        )));
    }

    let catalog = client.list_catalog()?;
    if catalog.len() < 2 {
        return Ok(Vec::new());
    }

    let ids: Vec<IdentityId> = catalog.iter().map(|s| s.id).collect();
    let pairs = client.compare_identities(&ids)?;

    // Symmetric lookup; pairs the backend did not report score 0.0.
    let mut similarity: HashMap<(IdentityId, IdentityId), f32> =
        HashMap::with_capacity(pairs.len() * 2);
    for pair in &pairs {
        similarity.insert((pair.a, pair.b), pair.similarity);
        similarity.insert((pair.b, pair.a), pair.similarity);
    }

    let mut claimed = vec![false; ids.len()];
    let mut groups = Vec::new();

    for i in 0..ids.len() {
        if claimed[i] {
            continue;
        }
        claimed[i] = true;
        let seed = ids[i];
        let mut members = vec![GroupMember {
            identity: seed,
            similarity_to_seed: 1.0,
        }];

        for j in (i + 1)..ids.len() {
            if claimed[j] {
                continue;
            }
            let score = similarity.get(&(seed, ids[j])).copied().unwrap_or(0.0);
            if score >= threshold {
                claimed[j] = true;
                members.push(GroupMember {
                    identity: ids[j],
                    similarity_to_seed: score,
                });
            }
        }

        if members.len() >= 2 {
            groups.push(SimilarityGroup {
                seed,
                members,
                threshold,
            });
        }
    }

    groups.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then(a.seed.cmp(&b.seed))
    });

    debug!(
        threshold,
        groups = groups.len(),
        identities = ids.len(),
        "computed similarity groups"
    );
    Ok(groups)
}
