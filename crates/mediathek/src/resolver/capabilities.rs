//! URI schemes the hosting runtime can play.
//!
//! Playback backends register and deregister schemes at any time. Writers
//! replace the whole set (copy-on-write), readers clone an `Arc` to an
//! immutable [`CapabilitySnapshot`], so a resolution never observes a set
//! that is half way through a mutation.

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySnapshot {
    version: u64,
    schemes: FxHashSet<String>,
}

impl CapabilitySnapshot {
    pub fn from_schemes<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            version: 0,
            schemes: schemes
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.schemes.contains(&scheme.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct ProtocolCapabilityRegistry {
    current: RwLock<Arc<CapabilitySnapshot>>,
}

impl ProtocolCapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schemes<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            current: RwLock::new(Arc::new(CapabilitySnapshot::from_schemes(schemes))),
        }
    }

    pub fn snapshot(&self) -> Arc<CapabilitySnapshot> {
        self.current.read().clone()
    }

    /// Returns `false` when the scheme was already registered.
    pub fn register(&self, scheme: &str) -> bool {
        let scheme = scheme.to_ascii_lowercase();
        self.update(|schemes| schemes.insert(scheme.clone()), &scheme, "registered")
    }

    /// Returns `false` when the scheme was not registered.
    pub fn deregister(&self, scheme: &str) -> bool {
        let scheme = scheme.to_ascii_lowercase();
        self.update(|schemes| schemes.remove(&scheme), &scheme, "deregistered")
    }

    fn update<F>(&self, mutate: F, scheme: &str, action: &str) -> bool
    where
        F: FnOnce(&mut FxHashSet<String>) -> bool,
    {
        let mut current = self.current.write();
        let mut schemes = current.schemes.clone();
        if !mutate(&mut schemes) {
            return false;
        }
        let version = current.version + 1;
        *current = Arc::new(CapabilitySnapshot { version, schemes });
        debug!(scheme, version, "Playback scheme {action}");
        true
    }
}
