//! On-flash shape of the bus registry.
//!
//! ```json
//! { "count": 2,
//!   "sensors": [ { "id": 1, "pin": 25, "s88base": 1024, "count": 16 }, ... ] }
//! ```
//!
//! The same record, plus a `state` bit-string, is used for the live
//! status snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage namespace of the persisted bus list.
pub const S88_NAMESPACE: &str = "cfg";
/// Fixed resource name of the persisted bus list.
pub const S88_BUSES_KEY: &str = "s88.json";
/// Largest blob the bus list may occupy.
pub const MAX_BLOB_SIZE: usize = 4000;

/// One persisted bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRecord {
    pub id: u8,
    pub pin: u8,
    #[serde(rename = "s88base")]
    pub sensor_base: u32,
    pub count: u16,
}

/// Whole persisted registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBuses {
    pub count: usize,
    #[serde(default)]
    pub sensors: Vec<BusRecord>,
}

impl PersistedBuses {
    pub fn new(records: Vec<BusRecord>) -> Self {
        Self {
            count: records.len(),
            sensors: records,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|_| Error::Persist("bus list encode failed"))
    }

    /// Parse a stored blob.  An empty blob means "nothing stored".
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|_| Error::Persist("bus list is not valid JSON"))
    }
}

/// Live snapshot of one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStatus {
    #[serde(flatten)]
    pub record: BusRecord,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
}
