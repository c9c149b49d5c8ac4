//! Versioned JSON envelope: `{"version": 1, "data": ...}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::PersistError;
use super::storage::Storage;

/// Current envelope format version
pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Load and unwrap a value. `Ok(None)` when nothing is stored under `key`.
pub fn load<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, PersistError> {
    let Some(json) = storage.get(key)? else {
        return Ok(None);
    };
    // Check the version before touching the payload shape
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(&json)?;
    if envelope.version != ENVELOPE_VERSION {
        return Err(PersistError::VersionMismatch {
            found: envelope.version,
            expected: ENVELOPE_VERSION,
        });
    }
    Ok(Some(serde_json::from_value(envelope.data)?))
}

/// Wrap and store a value
pub fn store<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), PersistError> {
    let envelope = Envelope {
        version: ENVELOPE_VERSION,
        data: value,
    };
    let json = serde_json::to_string(&envelope)?;
    storage.set(key, &json)
}
