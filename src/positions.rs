use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::http::HostClient;

/// Settings key holding the saved layout.
pub const POSITIONS_SETTING: &str = "site_flow_positions";
const POSITIONS_ROUTE: &str = "flow-editor/v1/positions";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

/// Node id to world position. Saved and loaded as one document.
pub type PositionMap = BTreeMap<String, Position>;

/// Drops entries with non-finite coordinates, returning how many were removed.
pub fn retain_finite(positions: &mut PositionMap) -> usize {
    let before = positions.len();
    positions.retain(|_, position| position.is_finite());
    before - positions.len()
}

/// Reads a stored layout leniently: unknown shapes and broken entries are skipped.
pub fn decode_position_map(value: &Value) -> PositionMap {
    let Some(object) = value.as_object() else {
        // An empty PHP array is serialized as `[]`.
        return PositionMap::new();
    };

    object
        .iter()
        .filter_map(|(id, raw)| {
            Position::deserialize(raw)
                .ok()
                .filter(|position| position.is_finite())
                .map(|position| (id.clone(), position))
        })
        .collect()
}

pub trait PositionStore: Send + Sync {
    fn load(&self) -> Result<PositionMap, GatewayError>;

    /// Replaces the whole stored layout.
    fn set(&self, positions: &PositionMap) -> Result<(), GatewayError>;

    fn get(&self) -> PositionMap {
        match self.load() {
            Ok(positions) => positions,
            Err(error) => {
                warn!(error = %error, "could not load saved positions; using defaults");
                PositionMap::new()
            }
        }
    }
}

/// Layout stored under [`POSITIONS_SETTING`] in a local JSON settings document.
pub struct SettingsFileStore {
    path: PathBuf,
}

impl SettingsFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> GatewayError {
        GatewayError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_document(&self) -> Result<Map<String, Value>, GatewayError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(self.io_error(error)),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        let document: Value =
            serde_json::from_str(&raw).map_err(|source| GatewayError::Decode {
                origin: self.path.display().to_string(),
                source,
            })?;

        Ok(match document {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }
}

impl PositionStore for SettingsFileStore {
    fn load(&self) -> Result<PositionMap, GatewayError> {
        let document = self.read_document()?;
        Ok(document
            .get(POSITIONS_SETTING)
            .map(decode_position_map)
            .unwrap_or_default())
    }

    fn set(&self, positions: &PositionMap) -> Result<(), GatewayError> {
        let mut document = self.read_document().unwrap_or_else(|error| {
            warn!(error = %error, "settings file unreadable; rewriting it");
            Map::new()
        });

        let mut finite = positions.clone();
        retain_finite(&mut finite);
        document.insert(POSITIONS_SETTING.to_owned(), json!(finite));

        let encoded = serde_json::to_string_pretty(&Value::Object(document)).map_err(|source| {
            GatewayError::Decode {
                origin: self.path.display().to_string(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|error| self.io_error(error))?;
        fs::rename(&staging, &self.path).map_err(|error| self.io_error(error))?;
        Ok(())
    }
}

/// Layout stored by the host through the plugin's REST route.
pub struct RestPositionStore {
    client: HostClient,
}

impl RestPositionStore {
    pub fn new(client: HostClient) -> Self {
        Self { client }
    }
}

impl PositionStore for RestPositionStore {
    fn load(&self) -> Result<PositionMap, GatewayError> {
        let value = self.client.get_json(POSITIONS_ROUTE)?;
        Ok(decode_position_map(&value))
    }

    fn set(&self, positions: &PositionMap) -> Result<(), GatewayError> {
        let mut finite = positions.clone();
        retain_finite(&mut finite);
        self.client
            .post_json(POSITIONS_ROUTE, &json!({ "positions": finite }))?;
        Ok(())
    }
}

/// Writes layouts on a background thread so the UI never waits on storage.
///
/// Snapshots queued while a write is in flight collapse into the newest one.
pub struct PositionSaver {
    tx: Sender<PositionMap>,
}

impl PositionSaver {
    pub fn spawn(store: Arc<dyn PositionStore>) -> Self {
        let (tx, rx) = mpsc::channel::<PositionMap>();

        thread::spawn(move || {
            while let Ok(mut latest) = rx.recv() {
                while let Ok(newer) = rx.try_recv() {
                    latest = newer;
                }

                match store.set(&latest) {
                    Ok(()) => debug!(nodes = latest.len(), "saved node positions"),
                    Err(error) => warn!(error = %error, "failed to save node positions"),
                }
            }
        });

        Self { tx }
    }

    pub fn save(&self, positions: PositionMap) {
        if self.tx.send(positions).is_err() {
            warn!("position saver is gone; layout change kept in memory only");
        }
    }
}
