use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Display-only labels for peer addresses. Never consulted by the protocol.
#[derive(Clone)]
pub struct NicknameBook {
    local_addr: Arc<str>,
    names: Arc<RwLock<HashMap<String, String>>>,
}

impl NicknameBook {
    pub fn new(local_addr: impl Into<Arc<str>>) -> Self {
        Self { local_addr: local_addr.into(), names: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn set(&self, addr: &str, nick: &str) {
        self.names.write().insert(addr.to_string(), nick.to_string());
    }

    /// `you` for our own address, the nickname when one is set, else the address itself.
    pub fn label(&self, addr: &str) -> String {
        if addr == &*self.local_addr {
            return "you".into();
        }
        self.names.read().get(addr).cloned().unwrap_or_else(|| addr.to_string())
    }
}
