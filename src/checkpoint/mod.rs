//! Checkpoint and resume functionality for services.
//!
//! A checkpoint captures everything a [`Service`] needs to continue after a
//! process restart: the configuration (with recorded history states), the
//! context, and the macrostep history. Action executors are code and are
//! registered again after resuming.

use crate::core::{Configuration, StateHistory};
use crate::definition::MachineHandle;
use crate::effects::Service;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Summary of a service's activity, derived from its history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Time of the first recorded macrostep, or of the checkpoint if none
    pub started_at: DateTime<Utc>,

    /// Time of the last recorded macrostep, or of the checkpoint if none
    pub updated_at: DateTime<Utc>,

    /// Total microsteps taken across all recorded macrosteps
    pub microsteps: usize,

    /// Number of recorded macrosteps per event name
    pub events: HashMap<String, usize>,
}

impl ServiceMetadata {
    fn from_history(history: &StateHistory, now: DateTime<Utc>) -> Self {
        let records = history.records();
        let mut events = HashMap::new();
        for record in records {
            *events.entry(record.event.clone()).or_insert(0) += 1;
        }
        Self {
            started_at: records.first().map_or(now, |record| record.timestamp),
            updated_at: records.last().map_or(now, |record| record.timestamp),
            microsteps: records.iter().map(|record| record.microsteps).sum(),
            events,
        }
    }
}

/// Serializable checkpoint of a service.
/// Does NOT include action executors (not serializable).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint<C> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Id of the machine the service runs
    pub machine_id: String,

    /// Active configuration, including recorded history states
    pub configuration: Configuration,

    /// Caller-owned extended state
    pub context: C,

    /// Complete macrostep history
    pub history: StateHistory,

    /// Service metadata
    pub metadata: ServiceMetadata,
}

impl<C> Checkpoint<C> {
    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}

impl<C: Serialize + DeserializeOwned> Checkpoint<C> {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, rejecting unsupported versions.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?
            .check_version()
    }

    /// Serialize to the compact binary format.
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from the binary format, rejecting unsupported versions.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize::<Self>(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?
            .check_version()
    }
}

impl<C, Env> Service<C, Env>
where
    C: Clone + Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Capture the service's current state.
    pub fn checkpoint(&self) -> Checkpoint<C> {
        let now = Utc::now();
        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            machine_id: self.machine().id().to_string(),
            configuration: self.configuration().clone(),
            context: self.context().clone(),
            history: self.history().clone(),
            metadata: ServiceMetadata::from_history(self.history(), now),
        };
        debug!(
            checkpoint = %checkpoint.id,
            machine = %checkpoint.machine_id,
            records = checkpoint.history.len(),
            "Created checkpoint"
        );
        checkpoint
    }

    /// Resume a service from a checkpoint taken on the same machine.
    pub fn from_checkpoint(
        machine: MachineHandle<C>,
        checkpoint: Checkpoint<C>,
    ) -> Result<Self, CheckpointError> {
        let checkpoint = checkpoint.check_version()?;
        if checkpoint.machine_id != machine.id() {
            return Err(CheckpointError::MachineMismatch {
                expected: machine.id().to_string(),
                found: checkpoint.machine_id,
            });
        }

        let id = checkpoint.id;
        let service = Service::resume(
            machine,
            checkpoint.configuration,
            checkpoint.context,
            checkpoint.history,
        )
        .map_err(|e| CheckpointError::ValidationFailed(e.to_string()))?;

        debug!(checkpoint = %id, "Resumed service from checkpoint");
        Ok(service)
    }
}
