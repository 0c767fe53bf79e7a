use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;
use uuid::Uuid;

use crate::config::{ContextConfig, SnapshotField};
use crate::models::enums::MedHistoryType;
use crate::models::ClinicalSnapshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Snapshot not found: {0}")]
    NotFound(Uuid),

    #[error("Snapshot {id} is missing required field {field}")]
    MissingField { id: Uuid, field: String },

    #[error("Snapshot store lock poisoned")]
    LockFailed,
}

/// Assembles the snapshot a decision context needs.
///
/// Implementations restrict histories to the ones the context applies and
/// refuse snapshots lacking a required field.
pub trait SnapshotSource {
    fn assemble(&self, id: &Uuid, config: &ContextConfig) -> Result<ClinicalSnapshot, SourceError>;
}

/// Restrict a full snapshot to what `config` declares.
pub fn restrict(
    mut snapshot: ClinicalSnapshot,
    config: &ContextConfig,
) -> Result<ClinicalSnapshot, SourceError> {
    for field in &config.required_fields {
        let present = match field {
            SnapshotField::Age => snapshot.age.is_some(),
            SnapshotField::Sex => snapshot.sex.is_some(),
            SnapshotField::Ethnicity => snapshot.ethnicity.is_some(),
            SnapshotField::Flare => snapshot.flare.is_some(),
            SnapshotField::UltFacts => snapshot.ult.is_some(),
        };
        if !present {
            return Err(SourceError::MissingField {
                id: snapshot.id,
                field: field.as_str().to_string(),
            });
        }
    }

    snapshot.histories.retain(|h| config.applies(*h));
    if !config.applies(MedHistoryType::Ckd) {
        snapshot.ckd_detail = None;
    }
    if !config.applies(MedHistoryType::Diabetes) {
        snapshot.diabetes_detail = None;
    }
    if !config.applies(MedHistoryType::Gout) {
        snapshot.gout_detail = None;
    }
    Ok(snapshot)
}

/// In-memory snapshot store backed by RwLock.
pub struct MemorySnapshotSource {
    snapshots: RwLock<HashMap<Uuid, ClinicalSnapshot>>,
}

impl MemorySnapshotSource {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the full snapshot for its id.
    pub fn insert(&self, snapshot: ClinicalSnapshot) -> Result<(), SourceError> {
        let mut snapshots = self.snapshots.write().map_err(|_| SourceError::LockFailed)?;
        snapshots.insert(snapshot.id, snapshot);
        Ok(())
    }

    pub fn remove(&self, id: &Uuid) -> Result<Option<ClinicalSnapshot>, SourceError> {
        let mut snapshots = self.snapshots.write().map_err(|_| SourceError::LockFailed)?;
        Ok(snapshots.remove(id))
    }

    pub fn len(&self) -> Result<usize, SourceError> {
        let snapshots = self.snapshots.read().map_err(|_| SourceError::LockFailed)?;
        Ok(snapshots.len())
    }
}

impl Default for MemorySnapshotSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for MemorySnapshotSource {
    fn assemble(&self, id: &Uuid, config: &ContextConfig) -> Result<ClinicalSnapshot, SourceError> {
        let snapshot = {
            let snapshots = self.snapshots.read().map_err(|_| SourceError::LockFailed)?;
            snapshots.get(id).cloned().ok_or(SourceError::NotFound(*id))?
        };
        restrict(snapshot, config)
    }
}
