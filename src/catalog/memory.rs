//! In-memory [`CatalogClient`] used by engine tests.
//!
//! Implements the same contract as the real backend: exclusive embedding
//! ownership, merge-with-union semantics, tags created on first apply.
//! Individual tag applies can be made to fail to exercise partial-failure
//! reporting.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{EngineError, EntityKind};

use super::client::CatalogClient;
use super::{
    EmbeddingId, EmbeddingMatch, FaceEmbedding, IdentityDetail, IdentityId, IdentitySummary,
    LinkMethod, MediaId, MediaRef, MergedIdentity, NewEmbedding, PairSimilarity, TagId, TagRef,
};

#[derive(Default)]
struct State {
    identities: BTreeMap<i64, IdentityDetail>,
    similarities: HashMap<(i64, i64), f32>,
    tags: BTreeMap<i64, String>,
    media_tags: BTreeMap<i64, BTreeSet<i64>>,
    next_identity_id: i64,
    next_embedding_id: i64,
    next_tag_id: i64,
    fail_apply: HashSet<i64>,
}

#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_identity(&self, detail: IdentityDetail) {
        let mut state = self.state.lock().unwrap();
        state.next_identity_id = state.next_identity_id.max(detail.id.0);
        for e in &detail.embeddings {
            state.next_embedding_id = state.next_embedding_id.max(e.id.0);
        }
        state.identities.insert(detail.id.0, detail);
    }

    pub fn set_similarity(&self, a: IdentityId, b: IdentityId, similarity: f32) {
        let mut state = self.state.lock().unwrap();
        state.similarities.insert((a.0.min(b.0), a.0.max(b.0)), similarity);
    }

    /// Make `apply_tag` fail for the given media item.
    pub fn fail_apply_for(&self, media: MediaId) {
        self.state.lock().unwrap().fail_apply.insert(media.0);
    }

    pub fn clear_apply_failures(&self) {
        self.state.lock().unwrap().fail_apply.clear();
    }

    pub fn identity(&self, id: IdentityId) -> Option<IdentityDetail> {
        self.state.lock().unwrap().identities.get(&id.0).cloned()
    }

    pub fn remove_identity(&self, id: IdentityId) {
        self.state.lock().unwrap().identities.remove(&id.0);
    }

    pub fn media_tag_names(&self, media: MediaId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .media_tags
            .get(&media.0)
            .map(|tag_ids| {
                tag_ids
                    .iter()
                    .filter_map(|tid| state.tags.get(tid).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tag_exists(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .tags
            .values()
            .any(|n| n == name)
    }
}

fn summary_of(detail: &IdentityDetail) -> IdentitySummary {
    IdentitySummary {
        id: detail.id,
        name: detail.name.clone(),
        primary_embedding_id: detail.primary_embedding_id,
        embedding_count: detail.embeddings.len(),
        linked_media_count: detail.linked_media.len(),
    }
}

impl CatalogClient for MemoryCatalog {
    fn list_catalog(&self) -> Result<Vec<IdentitySummary>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state.identities.values().map(summary_of).collect())
    }

    fn get_identity(&self, id: IdentityId) -> Result<IdentityDetail, EngineError> {
        self.state
            .lock()
            .unwrap()
            .identities
            .get(&id.0)
            .cloned()
            .ok_or_else(|| EngineError::identity_not_found(id))
    }

    fn search_by_embedding(
        &self,
        _vector: &[f32],
        _threshold: f32,
    ) -> Result<Vec<EmbeddingMatch>, EngineError> {
        Ok(Vec::new())
    }

    fn compare_identities(
        &self,
        ids: &[IdentityId],
    ) -> Result<Vec<PairSimilarity>, EngineError> {
        let state = self.state.lock().unwrap();
        let mut pairs = Vec::new();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let key = (a.0.min(b.0), a.0.max(b.0));
                if let Some(&similarity) = state.similarities.get(&key) {
                    pairs.push(PairSimilarity { a, b, similarity });
                }
            }
        }
        Ok(pairs)
    }

    fn get_identity_media(&self, id: IdentityId) -> Result<Vec<MediaRef>, EngineError> {
        let state = self.state.lock().unwrap();
        state
            .identities
            .get(&id.0)
            .map(|d| d.linked_media.clone())
            .ok_or_else(|| EngineError::identity_not_found(id))
    }

    fn create_identity(
        &self,
        embedding: &NewEmbedding,
    ) -> Result<IdentitySummary, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.next_identity_id += 1;
        state.next_embedding_id += 1;
        let id = IdentityId(state.next_identity_id);
        let embedding = FaceEmbedding {
            id: EmbeddingId(state.next_embedding_id),
            owner: id,
            vector: embedding.vector.clone(),
            confidence: embedding.confidence,
            quality: embedding.quality,
            thumbnail: embedding.thumbnail.clone(),
            source_media: embedding.source_media,
            source_at: embedding.source_at,
        };
        let detail = IdentityDetail {
            id,
            name: format!("Person {}", id),
            primary_embedding_id: Some(embedding.id),
            embeddings: vec![embedding],
            linked_media: Vec::new(),
        };
        let summary = summary_of(&detail);
        state.identities.insert(id.0, detail);
        Ok(summary)
    }

    fn add_embedding(
        &self,
        id: IdentityId,
        embedding: &NewEmbedding,
    ) -> Result<usize, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.next_embedding_id += 1;
        let embedding_id = EmbeddingId(state.next_embedding_id);
        let detail = state
            .identities
            .get_mut(&id.0)
            .ok_or_else(|| EngineError::identity_not_found(id))?;
        detail.embeddings.push(FaceEmbedding {
            id: embedding_id,
            owner: id,
            vector: embedding.vector.clone(),
            confidence: embedding.confidence,
            quality: embedding.quality,
            thumbnail: embedding.thumbnail.clone(),
            source_media: embedding.source_media,
            source_at: embedding.source_at,
        });
        Ok(detail.embeddings.len())
    }

    fn delete_embedding(
        &self,
        id: IdentityId,
        embedding: EmbeddingId,
    ) -> Result<usize, EngineError> {
        let mut state = self.state.lock().unwrap();
        let detail = state
            .identities
            .get_mut(&id.0)
            .ok_or_else(|| EngineError::identity_not_found(id))?;
        let before = detail.embeddings.len();
        detail.embeddings.retain(|e| e.id != embedding);
        if detail.embeddings.len() == before {
            return Err(EngineError::NotFound {
                kind: EntityKind::Embedding,
                id: embedding.0,
            });
        }
        if detail.primary_embedding_id == Some(embedding) {
            detail.primary_embedding_id = None;
        }
        Ok(detail.embeddings.len())
    }

    fn delete_identity(&self, id: IdentityId) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state
            .identities
            .remove(&id.0)
            .map(|_| ())
            .ok_or_else(|| EngineError::identity_not_found(id))
    }

    fn merge_identities(
        &self,
        ordered: &[IdentityId],
    ) -> Result<MergedIdentity, EngineError> {
        let mut state = self.state.lock().unwrap();
        let target = *ordered
            .first()
            .ok_or_else(|| EngineError::Validation("empty merge request".to_string()))?;
        for &id in ordered {
            if !state.identities.contains_key(&id.0) {
                return Err(EngineError::identity_not_found(id));
            }
        }

        let mut moved_embeddings = Vec::new();
        let mut moved_media = Vec::new();
        for &source in &ordered[1..] {
            if source == target {
                continue;
            }
            if let Some(absorbed) = state.identities.remove(&source.0) {
                moved_embeddings.extend(absorbed.embeddings);
                moved_media.extend(absorbed.linked_media);
            }
        }

        let survivor = state.identities.get_mut(&target.0).unwrap();
        for mut e in moved_embeddings {
            e.owner = target;
            survivor.embeddings.push(e);
        }
        for m in moved_media {
            if !survivor.linked_media.iter().any(|r| r.media_id == m.media_id) {
                survivor.linked_media.push(m);
            }
        }
        Ok(MergedIdentity {
            survivor: target,
            name: survivor.name.clone(),
        })
    }

    fn link_identity_to_media(
        &self,
        id: IdentityId,
        media: MediaId,
        method: LinkMethod,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let detail = state
            .identities
            .get_mut(&id.0)
            .ok_or_else(|| EngineError::identity_not_found(id))?;
        if !detail.linked_media.iter().any(|r| r.media_id == media) {
            detail.linked_media.push(MediaRef {
                media_id: media,
                kind: super::MediaKind::Video,
                link_method: method,
            });
        }
        Ok(())
    }

    fn set_primary_embedding(
        &self,
        id: IdentityId,
        embedding: EmbeddingId,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let detail = state
            .identities
            .get_mut(&id.0)
            .ok_or_else(|| EngineError::identity_not_found(id))?;
        if !detail.embeddings.iter().any(|e| e.id == embedding) {
            return Err(EngineError::NotFound {
                kind: EntityKind::Embedding,
                id: embedding.0,
            });
        }
        detail.primary_embedding_id = Some(embedding);
        Ok(())
    }

    fn get_media_tags(&self, media: MediaId) -> Result<Vec<TagRef>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .media_tags
            .get(&media.0)
            .map(|tag_ids| {
                tag_ids
                    .iter()
                    .filter_map(|tid| {
                        state.tags.get(tid).map(|name| TagRef {
                            id: TagId(*tid),
                            name: name.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_tag_media(&self, tag_name: &str) -> Result<Vec<MediaId>, EngineError> {
        let state = self.state.lock().unwrap();
        let tag_id = match state.tags.iter().find(|(_, name)| *name == tag_name) {
            Some((&id, _)) => id,
            None => return Ok(Vec::new()),
        };
        Ok(state
            .media_tags
            .iter()
            .filter(|(_, tags)| tags.contains(&tag_id))
            .map(|(&media, _)| MediaId(media))
            .collect())
    }

    fn apply_tag(&self, media: MediaId, tag_name: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_apply.contains(&media.0) {
            return Err(EngineError::BackendUnavailable(format!(
                "injected failure for media {}",
                media
            )));
        }
        let existing = state
            .tags
            .iter()
            .find(|(_, name)| *name == tag_name)
            .map(|(&id, _)| id);
        let tag_id = match existing {
            Some(id) => id,
            None => {
                state.next_tag_id += 1;
                let id = state.next_tag_id;
                state.tags.insert(id, tag_name.to_string());
                id
            }
        };
        state.media_tags.entry(media.0).or_default().insert(tag_id);
        Ok(())
    }

    fn remove_tag(&self, media: MediaId, tag: TagId) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if let Some(tags) = state.media_tags.get_mut(&media.0) {
            tags.remove(&tag.0);
        }
        Ok(())
    }

    fn delete_tag(&self, tag: TagId) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let in_use = state.media_tags.values().any(|tags| tags.contains(&tag.0));
        if in_use {
            return Err(EngineError::BackendUnavailable(format!(
                "tag {} still has members",
                tag
            )));
        }
        state.tags.remove(&tag.0);
        Ok(())
    }
}
