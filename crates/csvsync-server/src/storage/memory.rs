//! In-process blob store
//!
//! Objects live in a sorted map so listing order is deterministic. Every read
//! is recorded, and writes to chosen paths can be made to fail, which lets
//! callers observe exactly what a run touched.
//!
//! Test double for unit and integration tests; production runs use
//! [`super::S3Connector`].

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

use super::{BlobStore, StorageError};

type ObjectKey = (String, String);

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<ObjectKey, Vec<u8>>>,
    reads: Mutex<Vec<ObjectKey>>,
    failing_writes: RwLock<HashSet<ObjectKey>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace an object.
    pub fn insert(&self, container: &str, path: &str, content: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key(container, path), content.into());
    }

    pub fn get(&self, container: &str, path: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key(container, path))
            .cloned()
    }

    /// Paths in `container`, sorted.
    pub fn paths(&self, container: &str) -> Vec<String> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Every `(container, path)` read so far, in order.
    pub fn reads(&self) -> Vec<(String, String)> {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make every future write to this object fail with an IO error.
    pub fn fail_writes_to(&self, container: &str, path: &str) {
        self.failing_writes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key(container, path));
    }
}

fn key(container: &str, path: &str) -> ObjectKey {
    (container.to_string(), path.to_string())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .paths(container)
            .into_iter()
            .filter(|path| path.starts_with(prefix))
            .collect())
    }

    async fn read_all(&self, container: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key(container, path));

        self.get(container, path)
            .ok_or_else(|| StorageError::not_found(container, path))
    }

    async fn write(
        &self,
        container: &str,
        path: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let object = key(container, path);

        if self
            .failing_writes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&object)
        {
            return Err(StorageError::io(container, path, "write rejected"));
        }

        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        if !overwrite && objects.contains_key(&object) {
            return Err(StorageError::AlreadyExists {
                container: container.to_string(),
                path: path.to_string(),
            });
        }
        objects.insert(object, content);

        Ok(())
    }
}
