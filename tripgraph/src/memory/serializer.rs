//! Serializer for checkpoints (value <-> bytes).
//!
//! Used by every `Checkpointer` implementation.

use crate::memory::checkpointer::CheckpointError;

/// Serializes and deserializes values for checkpoint storage.
pub trait Serializer<S>: Send + Sync {
    fn serialize(&self, value: &S) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

/// JSON-based serializer. Requires S: Serialize + serde::de::DeserializeOwned.
pub struct JsonSerializer;

impl<S> Serializer<S> for JsonSerializer
where
    S: serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, value: &S) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(value).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct TestState {
        value: String,
    }

    /// **Scenario**: Invalid JSON on deserialize returns CheckpointError::Serialization.
    #[test]
    fn json_serializer_invalid_json_deserialize_returns_checkpoint_error() {
        let ser = JsonSerializer;
        let invalid = b"{ not valid json ]";
        let result: Result<TestState, _> = ser.deserialize(invalid);
        match result {
            Err(CheckpointError::Serialization(s)) => assert!(!s.is_empty()),
            other => panic!("expected Serialization variant: {:?}", other),
        }
    }
}
