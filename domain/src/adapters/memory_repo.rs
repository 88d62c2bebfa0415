use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{CoreError, MappingRepository, ShortCode, UrlMapping};

/// In-memory repository for tests and the non-durable server mode. Every call
/// serialises on the internal mutex guarding the map.
pub struct InMemoryRepo {
    inner: Mutex<BTreeMap<String, String>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingRepository for InMemoryRepo {
    fn get(&self, code: &ShortCode) -> Result<Option<UrlMapping>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageUnavailable("mutex poisoned".into()))?;
        Ok(map
            .get(code.as_str())
            .map(|url| UrlMapping::new(code.clone(), url.clone())))
    }

    fn upsert(&self, mapping: &UrlMapping) -> Result<(), CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageUnavailable("mutex poisoned".into()))?;
        map.insert(
            mapping.short_code.as_str().to_string(),
            mapping.original_url.clone(),
        );
        Ok(())
    }

    fn count(&self) -> Result<usize, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageUnavailable("mutex poisoned".into()))?;
        Ok(map.len())
    }
}
