//! Validated write concern documents.
//!
//! A `WriteConcern` only ever holds keys from the write concern vocabulary. Values are
//! stored in canonical key order (`w`, `wtimeout`, `fsync`, `j`) regardless of the order
//! in which they were set, so documents produced from it compare predictably.
//!
//! `WriteConcernRef` is the live handle returned by a settings node: mutations made
//! through it are applied to the node itself.
use bson::{self, Bson};
use serde::{Serialize, Serializer};

use crate::common::WriteConcernKey;
use crate::error::Error::ConfigurationError;
use crate::settings::SettingsState;
use crate::Result;

use std::sync::{Arc, RwLock};

static KEYS: [WriteConcernKey; 4] = [WriteConcernKey::W,
                                    WriteConcernKey::WTimeout,
                                    WriteConcernKey::FSync,
                                    WriteConcernKey::Journal];

fn slot(key: WriteConcernKey) -> usize {
    match key {
        WriteConcernKey::W => 0,
        WriteConcernKey::WTimeout => 1,
        WriteConcernKey::FSync => 2,
        WriteConcernKey::Journal => 3,
    }
}

/// A mapping restricted to recognized write concern options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteConcern {
    values: [Option<Bson>; 4],
}

impl WriteConcern {
    /// Creates an empty write concern.
    pub fn new() -> WriteConcern {
        Default::default()
    }

    /// Builds a write concern from a document, validating every key and value.
    pub fn from_document(doc: &bson::Document) -> Result<WriteConcern> {
        let mut concern = WriteConcern::new();
        for (key, value) in doc.iter() {
            concern.set(key, value.clone())?;
        }
        Ok(concern)
    }

    /// Builds a write concern from a replacement value, which must be a document.
    ///
    /// An array of key/value pairs is rejected even though it names the same options.
    pub fn from_bson(value: Bson) -> Result<WriteConcern> {
        match value {
            Bson::Document(ref doc) => WriteConcern::from_document(doc),
            other => Err(ConfigurationError(format!("write_concern must be a document, not {}.",
                                                    other))),
        }
    }

    /// Sets a single option. The key may be an alias such as `wtimeoutMS` or `journal`.
    pub fn set<V: Into<Bson>>(&mut self, key: &str, value: V) -> Result<()> {
        let key = key.parse::<WriteConcernKey>()?;
        self.set_key(key, value.into())
    }

    /// Sets a single option by its parsed key.
    pub fn set_key(&mut self, key: WriteConcernKey, value: Bson) -> Result<()> {
        let value = key.validate(value)?;
        self.values[slot(key)] = Some(value);
        Ok(())
    }

    /// Removes an option, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Result<Option<Bson>> {
        let key = key.parse::<WriteConcernKey>()?;
        Ok(self.values[slot(key)].take())
    }

    /// Looks up an option. Unrecognized keys are never present.
    pub fn get(&self, key: &str) -> Option<&Bson> {
        key.parse::<WriteConcernKey>().ok().and_then(|key| self.get_key(key))
    }

    pub fn get_key(&self, key: WriteConcernKey) -> Option<&Bson> {
        self.values[slot(key)].as_ref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&mut self) {
        self.values = Default::default();
    }

    /// Copies every option set in `other` over this one. Both sides are already validated.
    pub fn overlay(&mut self, other: &WriteConcern) {
        for (slot, value) in self.values.iter_mut().zip(other.values.iter()) {
            if value.is_some() {
                *slot = value.clone();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Returns true if `w` is explicitly zero, i.e. the write must not be acknowledged.
    pub fn w_is_zero(&self) -> bool {
        match self.get_key(WriteConcernKey::W) {
            Some(&Bson::I32(0)) => true,
            _ => false,
        }
    }

    /// Iterates over the set options in canonical order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (WriteConcernKey, &'a Bson)> + 'a {
        KEYS.iter()
            .filter_map(move |key| self.get_key(*key).map(|value| (*key, value)))
    }

    /// Returns a detached document copy of the set options.
    pub fn to_document(&self) -> bson::Document {
        let mut doc = bson::Document::new();
        for (key, value) in self.iter() {
            doc.insert(key.name(), value.clone());
        }
        doc
    }
}

impl PartialEq<bson::Document> for WriteConcern {
    fn eq(&self, other: &bson::Document) -> bool {
        self.len() == other.len() &&
        other.iter().all(|(key, value)| self.get(key) == Some(value))
    }
}

impl From<WriteConcern> for bson::Document {
    fn from(concern: WriteConcern) -> bson::Document {
        concern.to_document()
    }
}

impl Serialize for WriteConcern {
    fn serialize<S: Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

/// A live reference to the write concern stored on a settings node.
///
/// Every mutation is validated like a whole-document replacement and is visible on the
/// owning node, and on nothing else: nodes created from it earlier or later hold their
/// own copies.
#[derive(Clone)]
pub struct WriteConcernRef {
    state: Arc<RwLock<SettingsState>>,
}

impl WriteConcernRef {
    pub(crate) fn new(state: Arc<RwLock<SettingsState>>) -> WriteConcernRef {
        WriteConcernRef { state }
    }

    /// Sets an option on the owning node, which also marks the node as safe.
    pub fn set<V: Into<Bson>>(&self, key: &str, value: V) -> Result<()> {
        let mut guard = self.state.write()?;
        guard.set_concern(key, value.into())
    }

    /// Removes an option from the owning node. `explicit_safe` is left untouched.
    pub fn remove(&self, key: &str) -> Result<Option<Bson>> {
        let mut guard = self.state.write()?;
        guard.write_concern.remove(key)
    }

    pub fn get(&self, key: &str) -> Result<Option<Bson>> {
        let guard = self.state.read()?;
        Ok(guard.write_concern.get(key).cloned())
    }

    /// Replaces the whole document on the owning node.
    pub fn replace<V: Into<Bson>>(&self, value: V) -> Result<()> {
        let mut guard = self.state.write()?;
        guard.replace_concern(value.into())
    }

    pub fn clear(&self) -> Result<()> {
        let mut guard = self.state.write()?;
        guard.write_concern.clear();
        Ok(())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.state.read()?.write_concern.is_empty())
    }

    /// Returns a detached copy of the current document.
    pub fn snapshot(&self) -> Result<WriteConcern> {
        Ok(self.state.read()?.write_concern.clone())
    }

    pub fn to_document(&self) -> Result<bson::Document> {
        Ok(self.state.read()?.write_concern.to_document())
    }
}
