use std::collections::BTreeMap;
use std::sync::Arc;

use quest_core::model::{ProgressState, ScreenId, TaskId};
use serde_json::Value;
use tracing::{debug, warn};

use crate::repository::KeyValueStore;

/// Storage key of the persisted progress record.
pub const PROGRESS_KEY: &str = "lfb_state_v1";

/// Loads and saves [`ProgressState`] without ever failing the caller.
///
/// Reads fall back to defaults field by field; writes that the backend rejects
/// are logged and dropped.
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    start_screen: ScreenId,
}

impl ProgressStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, start_screen: ScreenId) -> Self {
        Self {
            store,
            key: PROGRESS_KEY.to_owned(),
            start_screen,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The persisted record, or the default one when missing or unreadable.
    #[must_use]
    pub fn load(&self) -> ProgressState {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no persisted progress, starting fresh");
                return ProgressState::new(self.start_screen.clone());
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read persisted progress");
                return ProgressState::new(self.start_screen.clone());
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(fields)) => decode_fields(&fields, &self.start_screen),
            Ok(other) => {
                warn!(key = %self.key, kind = json_kind(&other), "persisted progress is not an object");
                ProgressState::new(self.start_screen.clone())
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "persisted progress is corrupt");
                ProgressState::new(self.start_screen.clone())
            }
        }
    }

    /// Write `state` durably. Failures are logged, never returned.
    pub fn save(&self, state: &ProgressState) {
        let encoded = match serde_json::to_string(state) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to encode progress");
                return;
            }
        };
        if let Err(err) = self.store.set(&self.key, &encoded) {
            warn!(key = %self.key, error = %err, "failed to persist progress");
        }
    }
}

fn decode_fields(fields: &serde_json::Map<String, Value>, start: &ScreenId) -> ProgressState {
    let current_screen = fields
        .get("currentScreen")
        .and_then(Value::as_str)
        .and_then(|raw| ScreenId::new(raw).ok())
        .unwrap_or_else(|| start.clone());

    let current_task_id = fields
        .get("currentTaskId")
        .and_then(Value::as_str)
        .and_then(|raw| TaskId::new(raw).ok());

    let completed = match fields.get("completed") {
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(id, done)| {
                let flag = done.as_bool();
                if flag.is_none() {
                    debug!(task = %id, "dropping non-boolean completion entry");
                }
                Some((TaskId::new(id.as_str()).ok()?, flag?))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    ProgressState::from_persisted(current_screen, current_task_id, completed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
