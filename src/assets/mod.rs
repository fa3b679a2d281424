//! Model loading
//!
//! The host fetches each model once and reports the result here. The
//! library answers the simulation's "is this model ready?" question through
//! [`ModelStatus`].

pub mod obj;

use std::collections::HashMap;

use thiserror::Error;

use crate::sim::{GameEvent, GameState, LoadStatus, ModelKey, ModelStatus};
pub use obj::{ObjError, ObjMesh};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("fetch of {path} failed: {reason}")]
    Fetch { path: String, reason: String },
    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("{path} is not a valid model: {source}")]
    Parse {
        path: String,
        #[source]
        source: ObjError,
    },
}

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(ObjMesh),
    Failed,
}

/// Every model the session has asked for, and where it stands
#[derive(Debug, Default)]
pub struct ModelLibrary {
    slots: HashMap<ModelKey, Slot>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a model as wanted. Returns true the first time, when the caller
    /// should start the fetch.
    pub fn request(&mut self, key: ModelKey) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(key, Slot::Pending);
        log::debug!("Requesting model {}", key.path());
        true
    }

    /// Per-frame bookkeeping for the host.
    ///
    /// Registers every model named in `events` and returns the ones that
    /// need a fetch, then settles all `Loading` fish against the models that
    /// are already ready or failed. Fish whose model loaded earlier in the
    /// session resolve here, since no new fetch callback will fire for them.
    pub fn service(&mut self, state: &mut GameState, events: &[GameEvent]) -> Vec<ModelKey> {
        let fetches: Vec<ModelKey> = events
            .iter()
            .filter_map(|event| match event {
                GameEvent::ModelRequested(key) if self.request(*key) => Some(*key),
                _ => None,
            })
            .collect();
        state.sync_models(self);
        fetches
    }

    /// Store fetched OBJ text. A parse failure marks the model failed.
    pub fn on_loaded(&mut self, key: ModelKey, source: &str) -> Result<(), AssetError> {
        match obj::parse(source) {
            Ok(mesh) => {
                log::info!(
                    "Loaded {} ({} triangles)",
                    key.path(),
                    mesh.triangle_count()
                );
                self.slots.insert(key, Slot::Ready(mesh));
                Ok(())
            }
            Err(source) => {
                self.slots.insert(key, Slot::Failed);
                Err(AssetError::Parse {
                    path: key.path().to_string(),
                    source,
                })
            }
        }
    }

    /// Record a failed fetch. There is no retry.
    pub fn on_failed(&mut self, key: ModelKey, error: &AssetError) {
        log::warn!("Model unavailable: {error}");
        self.slots.insert(key, Slot::Failed);
    }

    pub fn mesh(&self, key: ModelKey) -> Option<&ObjMesh> {
        match self.slots.get(&key) {
            Some(Slot::Ready(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// Number of models still in flight
    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, Slot::Pending))
            .count()
    }
}

impl ModelStatus for ModelLibrary {
    fn status(&self, key: ModelKey) -> LoadStatus {
        match self.slots.get(&key) {
            Some(Slot::Ready(_)) => LoadStatus::Ready,
            Some(Slot::Failed) => LoadStatus::Failed,
            Some(Slot::Pending) | None => LoadStatus::Pending,
        }
    }
}

/// Fetch a model file as text
#[cfg(target_arch = "wasm32")]
pub async fn fetch_text(path: &str) -> Result<String, AssetError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let fetch_error = |reason: wasm_bindgen::JsValue| AssetError::Fetch {
        path: path.to_string(),
        reason: format!("{reason:?}"),
    };

    let window = web_sys::window().ok_or_else(|| AssetError::Fetch {
        path: path.to_string(),
        reason: "no window".into(),
    })?;
    let response = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(fetch_error)?;
    let response: web_sys::Response = response.dyn_into().map_err(fetch_error)?;
    if !response.ok() {
        return Err(AssetError::Status {
            path: path.to_string(),
            status: response.status(),
        });
    }
    let text = JsFuture::from(response.text().map_err(fetch_error)?)
        .await
        .map_err(fetch_error)?;
    text.as_string().ok_or_else(|| AssetError::Fetch {
        path: path.to_string(),
        reason: "body is not text".into(),
    })
}
