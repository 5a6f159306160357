//! Wire encodings.
//!
//! JSON for browser and debugging clients, bincode for compact links. Both
//! carry the same message types; a transport picks one per connection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::MahjongResult;

/// Encoding negotiated for a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireFormat {
    #[default]
    Json,
    Binary,
}

impl WireFormat {
    pub fn encode<T: Serialize>(self, message: &T) -> MahjongResult<Vec<u8>> {
        match self {
            WireFormat::Json => Ok(serde_json::to_vec(message)?),
            WireFormat::Binary => Ok(bincode::serialize(message)?),
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> MahjongResult<T> {
        match self {
            WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
            WireFormat::Binary => Ok(bincode::deserialize(bytes)?),
        }
    }
}
