//! Catalog backend abstraction.
//!
//! The backend owns the vectors, the similarity primitive, and all
//! persistence. This trait is the request/response seam the engine talks
//! through; [`crate::catalog::HttpCatalog`] is the production
//! implementation.

use crate::error::EngineError;

use super::{
    EmbeddingId, EmbeddingMatch, IdentityDetail, IdentityId, IdentitySummary, LinkMethod,
    MediaId, MediaRef, MergedIdentity, NewEmbedding, PairSimilarity, TagId, TagRef,
};

pub trait CatalogClient: Send + Sync {
    // === Identity reads ===

    /// List all identities in the catalog.
    fn list_catalog(&self) -> Result<Vec<IdentitySummary>, EngineError>;

    /// Fetch one identity with its embeddings and media links.
    fn get_identity(&self, id: IdentityId) -> Result<IdentityDetail, EngineError>;

    /// Find identities whose embeddings match the given vector.
    fn search_by_embedding(
        &self,
        vector: &[f32],
        threshold: f32,
    ) -> Result<Vec<EmbeddingMatch>, EngineError>;

    /// Pairwise similarity between the given identities, computed by the
    /// backend over their primary embeddings.
    fn compare_identities(
        &self,
        ids: &[IdentityId],
    ) -> Result<Vec<PairSimilarity>, EngineError>;

    /// Media items referencing an identity.
    fn get_identity_media(&self, id: IdentityId) -> Result<Vec<MediaRef>, EngineError>;

    // === Identity writes ===

    /// Create a new identity from its first embedding. The backend assigns
    /// the id and an auto-generated name.
    fn create_identity(
        &self,
        embedding: &NewEmbedding,
    ) -> Result<IdentitySummary, EngineError>;

    /// Append an embedding to an identity. Returns the resulting embedding
    /// count.
    fn add_embedding(
        &self,
        id: IdentityId,
        embedding: &NewEmbedding,
    ) -> Result<usize, EngineError>;

    /// Delete a single embedding. Returns the count remaining on the
    /// identity; deleting the last embedding does not delete the identity.
    fn delete_embedding(
        &self,
        id: IdentityId,
        embedding: EmbeddingId,
    ) -> Result<usize, EngineError>;

    /// Delete an identity, cascading its embeddings and media links.
    fn delete_identity(&self, id: IdentityId) -> Result<(), EngineError>;

    /// Merge the given identities into the first one. The backend is the
    /// sole authority for atomically reassigning embedding ownership and
    /// unioning media links; this call is not idempotent and must never be
    /// retried automatically.
    fn merge_identities(
        &self,
        ordered: &[IdentityId],
    ) -> Result<MergedIdentity, EngineError>;

    fn link_identity_to_media(
        &self,
        id: IdentityId,
        media: MediaId,
        method: LinkMethod,
    ) -> Result<(), EngineError>;

    fn set_primary_embedding(
        &self,
        id: IdentityId,
        embedding: EmbeddingId,
    ) -> Result<(), EngineError>;

    // === Tag operations (media dedup groups) ===

    /// Tags currently present on a media item.
    fn get_media_tags(&self, media: MediaId) -> Result<Vec<TagRef>, EngineError>;

    /// Media items carrying the named tag.
    fn get_tag_media(&self, tag_name: &str) -> Result<Vec<MediaId>, EngineError>;

    /// Apply a tag by name, creating the tag definition if needed.
    /// Applying an already-present tag is a no-op, not an error.
    fn apply_tag(&self, media: MediaId, tag_name: &str) -> Result<(), EngineError>;

    fn remove_tag(&self, media: MediaId, tag: TagId) -> Result<(), EngineError>;

    /// Delete a tag definition that no longer has members.
    fn delete_tag(&self, tag: TagId) -> Result<(), EngineError>;
}
