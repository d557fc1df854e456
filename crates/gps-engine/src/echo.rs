//! Raw sentence echo buffers

use std::sync::{Arc, Mutex, MutexGuard};

/// Caller-held buffer that receives a verbatim copy of each dispatched
/// sentence of one family.
///
/// Clones share the same storage: keep one clone, register the other with
/// the engine. Each dispatch replaces the previous contents.
#[derive(Debug, Clone, Default)]
pub struct EchoBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl EchoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest sentence, with invalid UTF-8 replaced
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Latest sentence as raw bytes
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Check if nothing has been echoed yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn write(&self, line: &[u8]) {
        let mut buffer = self.lock();
        buffer.clear();
        buffer.extend_from_slice(line);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // Poisoning only means a holder panicked; the bytes are still whole
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
