//! Domain types for the face identity catalog.
//!
//! The catalog itself (vectors, persistence, similarity primitives) lives in
//! an external backend service; this crate only holds typed views of it and
//! issues merge/delete/tag requests through [`client::CatalogClient`].

pub mod cache;
pub mod client;
pub mod http;

#[cfg(test)]
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use cache::CatalogCache;
pub use client::CatalogClient;
pub use http::HttpCatalog;

/// Stable numeric key of an identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdentityId(pub i64);

/// Key of a single embedding capture.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmbeddingId(pub i64);

/// Key of a video or image in the media library.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MediaId(pub i64);

/// Key of a tag definition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for EmbeddingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

/// How an identity got linked to a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkMethod {
    /// Linked by the face recognition pipeline.
    #[default]
    Recognized,
    /// Linked by hand in the (out-of-scope) UI.
    Manual,
}

/// A media item referencing an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_id: MediaId,
    pub kind: MediaKind,
    pub link_method: LinkMethod,
}

/// One face capture. Immutable once created; only deletable.
///
/// An embedding belongs to exactly one identity at a time; a merge reassigns
/// ownership on the backend, it never copies.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEmbedding {
    pub id: EmbeddingId,
    pub owner: IdentityId,
    /// Opaque feature vector, never mutated after creation.
    pub vector: Vec<f32>,
    /// Detection confidence in 0..1. Missing values decode as 0.0.
    pub confidence: f32,
    /// Derived capture quality in 0..1. Missing values decode as 0.0.
    pub quality: f32,
    /// Opaque thumbnail crop reference.
    pub thumbnail: Option<String>,
    pub source_media: Option<MediaId>,
    pub source_at: Option<DateTime<Utc>>,
}

/// A new embedding payload handed to the catalog, as produced by the
/// external face detection pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct NewEmbedding {
    pub vector: Vec<f32>,
    pub confidence: f32,
    #[serde(rename = "quality_score")]
    pub quality: f32,
    pub thumbnail: Option<String>,
    #[serde(rename = "source_media_id")]
    pub source_media: Option<MediaId>,
    #[serde(rename = "source_timestamp")]
    pub source_at: Option<DateTime<Utc>>,
}

/// Catalog listing entry for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySummary {
    pub id: IdentityId,
    pub name: String,
    pub primary_embedding_id: Option<EmbeddingId>,
    pub embedding_count: usize,
    pub linked_media_count: usize,
}

/// Full identity record with its embeddings and media links.
#[derive(Debug, Clone)]
pub struct IdentityDetail {
    pub id: IdentityId,
    pub name: String,
    /// Must reference an embedding currently owned by this identity.
    pub primary_embedding_id: Option<EmbeddingId>,
    pub embeddings: Vec<FaceEmbedding>,
    pub linked_media: Vec<MediaRef>,
}

/// One identity matched by an embedding search.
#[derive(Debug, Clone)]
pub struct EmbeddingMatch {
    pub identity: IdentityId,
    pub similarity: f32,
    pub embeddings: Vec<FaceEmbedding>,
}

/// Pairwise similarity between two identities, computed by the backend
/// over their primary embeddings.
#[derive(Debug, Clone, Copy)]
pub struct PairSimilarity {
    pub a: IdentityId,
    pub b: IdentityId,
    pub similarity: f32,
}

/// Backend acknowledgement of a merge.
#[derive(Debug, Clone)]
pub struct MergedIdentity {
    pub survivor: IdentityId,
    pub name: String,
}

/// A tag present on a media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub id: TagId,
    pub name: String,
}
