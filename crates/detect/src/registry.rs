//! Classification registry.
//!
//! Maps exact application names to descriptors, indexed by fingerprint.
//! Built once and read-only afterwards, so it can be shared freely.

use std::collections::HashMap;

use crate::catalog::{OperationDescriptor, Software, KNOWN_APPLICATIONS};
use crate::fingerprint::fingerprint;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// The name is not a registered application.
    #[error("unknown application: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    descriptor: OperationDescriptor,
}

/// Registry of known applications.
pub struct ClassificationRegistry {
    by_fingerprint: HashMap<u8, Vec<Entry>>,
    len: usize,
}

impl ClassificationRegistry {
    /// Registry over the built-in application table.
    pub fn builtin() -> Self {
        Self::from_entries(
            KNOWN_APPLICATIONS
                .iter()
                .map(|(name, software)| (*name, OperationDescriptor::of(*software))),
        )
    }

    /// Build a registry from an arbitrary name table.
    ///
    /// A name listed twice keeps its first descriptor.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, OperationDescriptor)>,
        S: Into<String>,
    {
        let mut by_fingerprint: HashMap<u8, Vec<Entry>> = HashMap::new();
        let mut len = 0;

        for (name, descriptor) in entries {
            let name = name.into();
            let bucket = by_fingerprint.entry(fingerprint(&name)).or_default();
            if bucket.iter().any(|e| e.name == name) {
                tracing::warn!(name = %name, "Duplicate application name ignored");
                continue;
            }
            bucket.push(Entry { name, descriptor });
            len += 1;
        }

        let collisions = by_fingerprint.values().filter(|b| b.len() > 1).count();
        tracing::debug!(entries = len, collisions, "Classification registry built");

        Self {
            by_fingerprint,
            len,
        }
    }

    /// Classify an application name.
    ///
    /// The fingerprint narrows the candidates; the exact name decides.
    pub fn classify(&self, name: &str) -> Result<OperationDescriptor, ClassifyError> {
        self.by_fingerprint
            .get(&fingerprint(name))
            .and_then(|bucket| bucket.iter().find(|e| e.name == name))
            .map(|e| e.descriptor)
            .ok_or_else(|| ClassifyError::NotFound(name.to_string()))
    }

    /// All registered names for a descriptor, sorted.
    pub fn names_for(&self, descriptor: OperationDescriptor) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_fingerprint
            .values()
            .flatten()
            .filter(|e| e.descriptor == descriptor)
            .map(|e| e.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Registered names for a software's canonical descriptor.
    pub fn names_for_software(&self, software: Software) -> Vec<&str> {
        self.names_for(OperationDescriptor::of(software))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ClassificationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ClassificationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRegistry")
            .field("len", &self.len)
            .field("buckets", &self.by_fingerprint.len())
            .finish()
    }
}
