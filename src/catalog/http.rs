//! JSON-over-HTTP implementation of [`CatalogClient`].
//!
//! Response shapes are consumed permissively: optional fields are declared
//! as such and defended with defaults at decode time, never inspected at
//! runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::{EngineError, EntityKind};

use super::client::CatalogClient;
use super::{
    EmbeddingId, EmbeddingMatch, FaceEmbedding, IdentityDetail, IdentityId, IdentitySummary,
    LinkMethod, MediaId, MediaKind, MediaRef, MergedIdentity, NewEmbedding, PairSimilarity,
    TagId, TagRef,
};

pub struct HttpCatalog {
    endpoint: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl HttpCatalog {
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
            agent,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            &config.endpoint,
            config.api_key.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.endpoint, path);
        let mut req = self
            .agent
            .request(method, &url)
            .set("Content-Type", "application/json");
        if let Some(ref api_key) = self.api_key {
            req = req.set("Authorization", &format!("Bearer {}", api_key));
        }
        req
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        missing: Option<(EntityKind, i64)>,
    ) -> Result<T, EngineError> {
        let response = self
            .request("GET", path)
            .call()
            .map_err(|e| map_err(e, missing))?;
        decode(response)
    }

    fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        missing: Option<(EntityKind, i64)>,
    ) -> Result<T, EngineError> {
        let response = self
            .request("POST", path)
            .send_json(body)
            .map_err(|e| map_err(e, missing))?;
        decode(response)
    }

    fn delete_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        missing: Option<(EntityKind, i64)>,
    ) -> Result<T, EngineError> {
        let response = self
            .request("DELETE", path)
            .call()
            .map_err(|e| map_err(e, missing))?;
        decode(response)
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T, EngineError> {
    response
        .into_json()
        .map_err(|e| EngineError::BackendUnavailable(format!("invalid response: {}", e)))
}

fn map_err(err: ureq::Error, missing: Option<(EntityKind, i64)>) -> EngineError {
    match err {
        ureq::Error::Status(404, _) => match missing {
            Some((kind, id)) => EngineError::NotFound { kind, id },
            None => EngineError::BackendUnavailable("HTTP 404".to_string()),
        },
        ureq::Error::Status(code, _) => {
            EngineError::BackendUnavailable(format!("HTTP {}", code))
        }
        ureq::Error::Transport(t) => EngineError::BackendUnavailable(t.to_string()),
    }
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct IdentitySummaryDto {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    primary_embedding_id: Option<i64>,
    #[serde(default)]
    embedding_count: usize,
    #[serde(default)]
    linked_media_count: usize,
}

impl IdentitySummaryDto {
    fn into_summary(self) -> IdentitySummary {
        IdentitySummary {
            id: IdentityId(self.id),
            name: self.name.unwrap_or_else(|| format!("Person {}", self.id)),
            primary_embedding_id: self.primary_embedding_id.map(EmbeddingId),
            embedding_count: self.embedding_count,
            linked_media_count: self.linked_media_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingDto {
    id: i64,
    #[serde(default)]
    vector: Vec<f32>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    quality_score: Option<f32>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    source_media_id: Option<i64>,
    #[serde(default)]
    source_timestamp: Option<DateTime<Utc>>,
}

impl EmbeddingDto {
    fn into_embedding(self, owner: IdentityId) -> FaceEmbedding {
        FaceEmbedding {
            id: EmbeddingId(self.id),
            owner,
            vector: self.vector,
            confidence: self.confidence.unwrap_or(0.0),
            quality: self.quality_score.unwrap_or(0.0),
            thumbnail: self.thumbnail,
            source_media: self.source_media_id.map(MediaId),
            source_at: self.source_timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdentityDetailDto {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    primary_embedding_id: Option<i64>,
    #[serde(default)]
    embeddings: Vec<EmbeddingDto>,
    #[serde(default)]
    linked_media: Vec<MediaRefDto>,
}

#[derive(Debug, Deserialize)]
struct MediaRefDto {
    media_id: i64,
    #[serde(default = "default_media_kind")]
    media_kind: MediaKind,
    #[serde(default)]
    link_method: LinkMethod,
}

fn default_media_kind() -> MediaKind {
    MediaKind::Image
}

impl MediaRefDto {
    fn into_ref(self) -> MediaRef {
        MediaRef {
            media_id: MediaId(self.media_id),
            kind: self.media_kind,
            link_method: self.link_method,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatchDto {
    identity_id: i64,
    #[serde(default)]
    similarity: f32,
    #[serde(default)]
    embeddings: Vec<EmbeddingDto>,
}

#[derive(Debug, Deserialize)]
struct PairSimilarityDto {
    a: i64,
    b: i64,
    #[serde(default)]
    similarity: f32,
}

#[derive(Debug, Deserialize)]
struct MergeResponseDto {
    survivor_id: i64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemainingCountDto {
    #[serde(default)]
    remaining_count: usize,
}

#[derive(Debug, Deserialize)]
struct TagDto {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AckDto {
    #[serde(default)]
    #[allow(dead_code)]
    success: bool,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    threshold: f32,
}

#[derive(Debug, Serialize)]
struct CompareRequest<'a> {
    identity_ids: &'a [IdentityId],
}

#[derive(Debug, Serialize)]
struct MergeRequestBody<'a> {
    identity_ids: &'a [IdentityId],
}

#[derive(Debug, Serialize)]
struct LinkRequest {
    media_id: MediaId,
    method: LinkMethod,
}

#[derive(Debug, Serialize)]
struct PrimaryRequest {
    embedding_id: EmbeddingId,
}

#[derive(Debug, Serialize)]
struct TagRequest<'a> {
    name: &'a str,
}

// ============================================================================
// Trait implementation
// ============================================================================

impl CatalogClient for HttpCatalog {
    fn list_catalog(&self) -> Result<Vec<IdentitySummary>, EngineError> {
        let dtos: Vec<IdentitySummaryDto> = self.get_json("/identities", None)?;
        Ok(dtos.into_iter().map(IdentitySummaryDto::into_summary).collect())
    }

    fn get_identity(&self, id: IdentityId) -> Result<IdentityDetail, EngineError> {
        let dto: IdentityDetailDto = self.get_json(
            &format!("/identities/{}", id),
            Some((EntityKind::Identity, id.0)),
        )?;
        let owner = IdentityId(dto.id);
        Ok(IdentityDetail {
            id: owner,
            name: dto.name.unwrap_or_else(|| format!("Person {}", dto.id)),
            primary_embedding_id: dto.primary_embedding_id.map(EmbeddingId),
            embeddings: dto
                .embeddings
                .into_iter()
                .map(|e| e.into_embedding(owner))
                .collect(),
            linked_media: dto.linked_media.into_iter().map(MediaRefDto::into_ref).collect(),
        })
    }

    fn search_by_embedding(
        &self,
        vector: &[f32],
        threshold: f32,
    ) -> Result<Vec<EmbeddingMatch>, EngineError> {
        let body = SearchRequest { vector, threshold };
        let dtos: Vec<MatchDto> = self.post_json("/identities/search", &body, None)?;
        Ok(dtos
            .into_iter()
            .map(|m| {
                let identity = IdentityId(m.identity_id);
                EmbeddingMatch {
                    identity,
                    similarity: m.similarity,
                    embeddings: m
                        .embeddings
                        .into_iter()
                        .map(|e| e.into_embedding(identity))
                        .collect(),
                }
            })
            .collect())
    }

    fn compare_identities(
        &self,
        ids: &[IdentityId],
    ) -> Result<Vec<PairSimilarity>, EngineError> {
        let body = CompareRequest { identity_ids: ids };
        let dtos: Vec<PairSimilarityDto> =
            self.post_json("/identities/compare", &body, None)?;
        Ok(dtos
            .into_iter()
            .map(|p| PairSimilarity {
                a: IdentityId(p.a),
                b: IdentityId(p.b),
                similarity: p.similarity,
            })
            .collect())
    }

    fn get_identity_media(&self, id: IdentityId) -> Result<Vec<MediaRef>, EngineError> {
        let dtos: Vec<MediaRefDto> = self.get_json(
            &format!("/identities/{}/media", id),
            Some((EntityKind::Identity, id.0)),
        )?;
        Ok(dtos.into_iter().map(MediaRefDto::into_ref).collect())
    }

    fn create_identity(
        &self,
        embedding: &NewEmbedding,
    ) -> Result<IdentitySummary, EngineError> {
        let dto: IdentitySummaryDto = self.post_json("/identities", embedding, None)?;
        Ok(dto.into_summary())
    }

    fn add_embedding(
        &self,
        id: IdentityId,
        embedding: &NewEmbedding,
    ) -> Result<usize, EngineError> {
        let dto: RemainingCountDto = self.post_json(
            &format!("/identities/{}/embeddings", id),
            embedding,
            Some((EntityKind::Identity, id.0)),
        )?;
        Ok(dto.remaining_count)
    }

    fn delete_embedding(
        &self,
        id: IdentityId,
        embedding: EmbeddingId,
    ) -> Result<usize, EngineError> {
        let dto: RemainingCountDto = self.delete_json(
            &format!("/identities/{}/embeddings/{}", id, embedding),
            Some((EntityKind::Embedding, embedding.0)),
        )?;
        Ok(dto.remaining_count)
    }

    fn delete_identity(&self, id: IdentityId) -> Result<(), EngineError> {
        let _: AckDto = self.delete_json(
            &format!("/identities/{}", id),
            Some((EntityKind::Identity, id.0)),
        )?;
        Ok(())
    }

    fn merge_identities(
        &self,
        ordered: &[IdentityId],
    ) -> Result<MergedIdentity, EngineError> {
        let body = MergeRequestBody {
            identity_ids: ordered,
        };
        let dto: MergeResponseDto = self.post_json("/identities/merge", &body, None)?;
        Ok(MergedIdentity {
            survivor: IdentityId(dto.survivor_id),
            name: dto
                .name
                .unwrap_or_else(|| format!("Person {}", dto.survivor_id)),
        })
    }

    fn link_identity_to_media(
        &self,
        id: IdentityId,
        media: MediaId,
        method: LinkMethod,
    ) -> Result<(), EngineError> {
        let body = LinkRequest {
            media_id: media,
            method,
        };
        let _: AckDto = self.post_json(
            &format!("/identities/{}/media", id),
            &body,
            Some((EntityKind::Identity, id.0)),
        )?;
        Ok(())
    }

    fn set_primary_embedding(
        &self,
        id: IdentityId,
        embedding: EmbeddingId,
    ) -> Result<(), EngineError> {
        let body = PrimaryRequest {
            embedding_id: embedding,
        };
        let _: AckDto = self.post_json(
            &format!("/identities/{}/primary", id),
            &body,
            Some((EntityKind::Embedding, embedding.0)),
        )?;
        Ok(())
    }

    fn get_media_tags(&self, media: MediaId) -> Result<Vec<TagRef>, EngineError> {
        let dtos: Vec<TagDto> = self.get_json(
            &format!("/media/{}/tags", media),
            Some((EntityKind::Media, media.0)),
        )?;
        Ok(dtos
            .into_iter()
            .map(|t| TagRef {
                id: TagId(t.id),
                name: t.name,
            })
            .collect())
    }

    fn get_tag_media(&self, tag_name: &str) -> Result<Vec<MediaId>, EngineError> {
        let ids: Vec<i64> = self.get_json(&format!("/tags/{}/media", tag_name), None)?;
        Ok(ids.into_iter().map(MediaId).collect())
    }

    fn apply_tag(&self, media: MediaId, tag_name: &str) -> Result<(), EngineError> {
        let body = TagRequest { name: tag_name };
        let _: AckDto = self.post_json(
            &format!("/media/{}/tags", media),
            &body,
            Some((EntityKind::Media, media.0)),
        )?;
        Ok(())
    }

    fn remove_tag(&self, media: MediaId, tag: TagId) -> Result<(), EngineError> {
        let _: AckDto = self.delete_json(
            &format!("/media/{}/tags/{}", media, tag),
            Some((EntityKind::Tag, tag.0)),
        )?;
        Ok(())
    }

    fn delete_tag(&self, tag: TagId) -> Result<(), EngineError> {
        let _: AckDto = self.delete_json(
            &format!("/tags/{}", tag),
            Some((EntityKind::Tag, tag.0)),
        )?;
        Ok(())
    }
}
