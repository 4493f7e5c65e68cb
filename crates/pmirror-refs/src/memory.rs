//! In-memory reference store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{RefError, Result};
use crate::names::validate_tag_name;
use crate::traits::RefStore;
use crate::types::TagRef;

/// An in-memory implementation of [`RefStore`].
///
/// Refs live in a `BTreeMap` behind a `RwLock`; data is lost when the store
/// is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, TagRef>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<TagRef>> {
        let refs = self.refs.read().map_err(|_| RefError::Poisoned)?;
        Ok(refs.get(name).cloned())
    }

    fn create_ref(&self, name: &str, reference: &TagRef) -> Result<()> {
        validate_tag_name(&reference.name)?;
        let mut refs = self.refs.write().map_err(|_| RefError::Poisoned)?;
        if refs.contains_key(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        refs.insert(name.to_string(), reference.clone());
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, TagRef)>> {
        let refs = self.refs.read().map_err(|_| RefError::Poisoned)?;
        Ok(refs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
