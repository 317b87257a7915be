//! Per-run result cache.
//!
//! Keys are `(stage, segment index, content hash of inputs)`, so a repeated
//! stage with identical inputs reuses its artifact instead of calling the
//! remote service again. The cache is owned by the pipeline; nothing ambient.

use std::{collections::HashMap, path::PathBuf, sync::Mutex};

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Image,
    Video,
    Voice,
    TalkingHead,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    stage: Stage,
    segment: Option<usize>,
    digest: [u8; 32],
}

impl CacheKey {
    pub fn new(stage: Stage, segment: Option<usize>, inputs: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for input in inputs {
            hasher.update(input.as_bytes());
            // length-prefix-free separator so ["ab","c"] != ["a","bc"]
            hasher.update([0u8]);
        }
        Self {
            stage,
            segment,
            digest: hasher.finalize().into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, PathBuf>>,
}

impl ResultCache {
    /// Returns the cached artifact path, provided the file still exists.
    pub fn get(&self, key: &CacheKey) -> Option<PathBuf> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).filter(|p| p.exists()).cloned()
    }

    pub fn put(&self, key: CacheKey, path: PathBuf) {
        self.entries.lock().unwrap().insert(key, path);
    }
}
