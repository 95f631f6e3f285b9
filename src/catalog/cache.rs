//! In-memory cache of the last-loaded catalog listing.
//!
//! An explicit object with an invalidation hook, called after every
//! mutating operation. Similarity groups and duplicate clusters are never
//! cached here; they are recomputed per request.

use super::{IdentityId, IdentitySummary};

#[derive(Debug, Default)]
pub struct CatalogCache {
    identities: Option<Vec<IdentitySummary>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached listing with a fresh snapshot.
    pub fn store(&mut self, identities: Vec<IdentitySummary>) {
        self.identities = Some(identities);
    }

    /// The cached listing, or `None` if it has been invalidated.
    pub fn identities(&self) -> Option<&[IdentitySummary]> {
        self.identities.as_deref()
    }

    /// Drop the cached listing entirely. Call after any mutation whose
    /// effect on the listing is not known locally (deletes, tag writes).
    pub fn invalidate(&mut self) {
        self.identities = None;
    }

    /// Remove absorbed identities from the listing after a successful
    /// merge, keeping the survivor visible without a refetch. The
    /// survivor's counts are refreshed on the next listing load.
    pub fn remove_identities(&mut self, absorbed: &[IdentityId]) {
        if let Some(ref mut identities) = self.identities {
            identities.retain(|summary| !absorbed.contains(&summary.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64) -> IdentitySummary {
        IdentitySummary {
            id: IdentityId(id),
            name: format!("Person {}", id),
            primary_embedding_id: None,
            embedding_count: 1,
            linked_media_count: 0,
        }
    }

    #[test]
    fn test_store_and_invalidate() {
        let mut cache = CatalogCache::new();
        assert!(cache.identities().is_none());

        cache.store(vec![summary(1), summary(2)]);
        assert_eq!(cache.identities().unwrap().len(), 2);

        cache.invalidate();
        assert!(cache.identities().is_none());
    }

    #[test]
    fn test_remove_absorbed() {
        let mut cache = CatalogCache::new();
        cache.store(vec![summary(1), summary(2), summary(3)]);

        cache.remove_identities(&[IdentityId(2), IdentityId(3)]);
        let remaining = cache.identities().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, IdentityId(1));
    }

    #[test]
    fn test_remove_on_empty_cache_is_noop() {
        let mut cache = CatalogCache::new();
        cache.remove_identities(&[IdentityId(1)]);
        assert!(cache.identities().is_none());
    }
}
