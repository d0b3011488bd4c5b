use crate::error::StoreError;
use crate::interpreter::SessionSnapshot;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use parking_lot::RwLock;

/// Key-value persistence for live sessions, keyed by session id.
pub trait SessionStore: Send + Sync {
    fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, StoreError>;
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;
    fn remove(&self, session_id: &str) -> Result<(), StoreError>;
}

/// An in-process store keeping bincode-encoded snapshots.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<AHashMap<String, Vec<u8>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        let entries = self.entries.read();
        let Some(bytes) = entries.get(session_id) else {
            return Ok(None);
        };
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| Some(snapshot))
            .map_err(|e| StoreError::Codec(format!("Deserialization failed: {}", e)))
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let bytes = encode_to_vec(snapshot, standard())
            .map_err(|e| StoreError::Codec(format!("Serialization failed: {}", e)))?;
        self.entries
            .write()
            .insert(snapshot.session_id.clone(), bytes);
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<(), StoreError> {
        self.entries.write().remove(session_id);
        Ok(())
    }
}
