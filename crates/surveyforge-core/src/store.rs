//! Questionnaire Store
//!
//! Keyed holder of canonical questionnaires, the single source of truth
//! for reads, edits and exports after generation. Process-lifetime only.
//!
//! Callers depend on the [`QuestionnaireStore`] trait, so the in-memory map
//! can be swapped for a per-key locking or transactional backend.
//!
//! There is no per-questionnaire edit serialization: two edits that read the
//! same questionnaire and save back race, and the last `save` wins.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SurveyError};
use crate::types::{Questionnaire, QuestionnaireMetadata, Section, Timestamp};

/// Partial update applied by [`QuestionnaireStore::update`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnairePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
    #[serde(default)]
    pub metadata: Option<QuestionnaireMetadata>,
}

impl QuestionnairePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Shallow merge: each present field replaces the existing one wholesale
    fn apply(self, target: &mut Questionnaire) {
        if let Some(title) = self.title {
            target.title = Some(title);
        }
        if let Some(created_at) = self.created_at {
            target.created_at = created_at;
        }
        if let Some(sections) = self.sections {
            target.sections = sections;
        }
        if let Some(metadata) = self.metadata {
            target.metadata = metadata;
        }
        target.recompute_totals();
    }
}

pub trait QuestionnaireStore: Send + Sync {
    /// Upsert by identifier; fails with `MissingIdentifier` when the id is blank
    fn save(&self, questionnaire: Questionnaire) -> Result<Questionnaire>;

    fn get(&self, id: &str) -> Option<Questionnaire>;

    /// Merge `patch` over an existing record, keeping its id
    fn update(&self, id: &str, patch: QuestionnairePatch) -> Result<Questionnaire>;

    /// Returns whether an entry was removed
    fn delete(&self, id: &str) -> bool;

    fn get_all(&self) -> Vec<Questionnaire>;

    fn clear(&self);

    fn size(&self) -> usize;
}

/// Map-backed store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    questionnaires: Arc<RwLock<HashMap<String, Questionnaire>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuestionnaireStore for InMemoryStore {
    fn save(&self, questionnaire: Questionnaire) -> Result<Questionnaire> {
        if !questionnaire.has_id() {
            return Err(SurveyError::MissingIdentifier);
        }
        self.questionnaires
            .write()
            .insert(questionnaire.id.clone(), questionnaire.clone());
        tracing::debug!(questionnaire_id = %questionnaire.id, "questionnaire saved");
        Ok(questionnaire)
    }

    fn get(&self, id: &str) -> Option<Questionnaire> {
        self.questionnaires.read().get(id).cloned()
    }

    fn update(&self, id: &str, patch: QuestionnairePatch) -> Result<Questionnaire> {
        let mut questionnaires = self.questionnaires.write();
        let existing = questionnaires
            .get_mut(id)
            .ok_or_else(|| SurveyError::NotFound(format!("Questionnaire not found: {}", id)))?;

        patch.apply(existing);
        existing.id = id.to_string();
        Ok(existing.clone())
    }

    fn delete(&self, id: &str) -> bool {
        self.questionnaires.write().remove(id).is_some()
    }

    fn get_all(&self) -> Vec<Questionnaire> {
        self.questionnaires.read().values().cloned().collect()
    }

    fn clear(&self) {
        self.questionnaires.write().clear();
    }

    fn size(&self) -> usize {
        self.questionnaires.read().len()
    }
}
