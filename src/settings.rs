//! Per-level settings for clients, databases, and collections.
//!
//! Every client, database, and collection owns a `Settings` node. A node is created from
//! its parent by copying the parent's current values; after that the two are unrelated,
//! so mutating one never affects the other. Operations invoked on a node consult only that
//! node's current state, merged with whatever the call itself overrides.
use bson::{self, Bson};
use log::warn;

use crate::common::{validate_bool, WriteConcernKey};
use crate::error::Error::ConfigurationError;
use crate::resolver::{self, Decision, WriteOptions};
use crate::write_concern::{WriteConcern, WriteConcernRef};
use crate::Result;

use std::sync::{Arc, RwLock};

/// Options declared when a node is constructed, either as keywords or in a connection string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeOptions {
    pub safe: Option<bool>,
    pub slave_okay: Option<bool>,
    pub write_concern: WriteConcern,
    /// Only meaningful for clients.
    pub replica_set: Option<String>,
}

impl NodeOptions {
    pub fn new() -> NodeOptions {
        Default::default()
    }

    /// Parses keyword options. Keys are matched case-insensitively.
    ///
    /// `safe` and `slave_okay` must be booleans; any other key outside the write concern
    /// vocabulary is rejected.
    pub fn from_document(doc: &bson::Document) -> Result<NodeOptions> {
        let mut options = NodeOptions::new();

        for (key, value) in doc.iter() {
            match key.to_ascii_lowercase().as_str() {
                "safe" => options.safe = Some(validate_bool(key, value)?),
                "slave_okay" | "slaveok" => options.slave_okay = Some(validate_bool(key, value)?),
                "replicaset" => options.replica_set = Some(replica_set_name(value)?),
                _ => {
                    let concern_key = key.parse::<WriteConcernKey>()?;
                    options.write_concern.set_key(concern_key, value.clone())?;
                }
            }
        }

        Ok(options)
    }

    /// Overlays `other` on top of these options; values present in `other` win.
    pub fn merge(&mut self, other: NodeOptions) {
        if other.safe.is_some() {
            self.safe = other.safe;
        }

        if other.slave_okay.is_some() {
            self.slave_okay = other.slave_okay;
        }

        if other.replica_set.is_some() {
            self.replica_set = other.replica_set;
        }

        self.write_concern.overlay(&other.write_concern);
    }
}

fn replica_set_name(value: &Bson) -> Result<String> {
    match *value {
        Bson::String(ref name) if !name.is_empty() => Ok(name.to_owned()),
        _ => Err(ConfigurationError("replicaSet must be a non-empty string.".to_owned())),
    }
}

/// The mutable state behind a settings node.
#[derive(Clone, Debug, Default)]
pub struct SettingsState {
    pub explicit_safe: bool,
    pub slave_okay: bool,
    pub write_concern: WriteConcern,
}

impl SettingsState {
    /// Sets a single write concern option. Every write concern mutation on a node passes
    /// through here: declaring any option is itself a request for acknowledgment.
    pub fn set_concern(&mut self, key: &str, value: Bson) -> Result<()> {
        self.write_concern.set(key, value)?;
        self.explicit_safe = true;
        Ok(())
    }

    /// Replaces the write concern wholesale. Nothing is changed unless every key is valid.
    pub fn replace_concern(&mut self, value: Bson) -> Result<()> {
        let replacement = WriteConcern::from_bson(value)?;
        self.write_concern.clear();
        for (key, value) in replacement.iter() {
            self.set_concern(key.name(), value.clone())?;
        }
        Ok(())
    }

    /// Applies construction options. Flags go first so that a write concern option
    /// declared alongside `safe=false` still leaves the node safe.
    pub fn apply(&mut self, options: &NodeOptions) -> Result<()> {
        if let Some(safe) = options.safe {
            self.explicit_safe = safe;
        }

        if let Some(slave_okay) = options.slave_okay {
            self.slave_okay = slave_okay;
        }

        for (key, value) in options.write_concern.iter() {
            self.set_concern(key.name(), value.clone())?;
        }

        if self.write_concern.w_is_zero() && self.write_concern.contains("wtimeout") {
            warn!("wtimeout is ignored when w=0; writes with these settings are never acknowledged");
        }

        Ok(())
    }

    /// Safe when explicitly requested or when any write concern option is declared.
    pub fn is_safe(&self) -> bool {
        self.explicit_safe || !self.write_concern.is_empty()
    }

    /// Whether a write with no per-call overrides waits for acknowledgment.
    pub fn acknowledges(&self) -> bool {
        self.is_safe() && !self.write_concern.w_is_zero()
    }
}

/// A settings node attached to a client, database, or collection.
pub struct Settings {
    state: Arc<RwLock<SettingsState>>,
}

impl Settings {
    /// Creates a root node. `acknowledged` is the initial value of `explicit_safe`.
    pub fn new(acknowledged: bool) -> Settings {
        Settings::from_state(SettingsState { explicit_safe: acknowledged, ..Default::default() })
    }

    /// Creates a root node and applies construction options to it.
    pub fn with_options(acknowledged: bool, options: &NodeOptions) -> Result<Settings> {
        let mut state = SettingsState { explicit_safe: acknowledged, ..Default::default() };
        state.apply(options)?;
        Ok(Settings::from_state(state))
    }

    fn from_state(state: SettingsState) -> Settings {
        Settings { state: Arc::new(RwLock::new(state)) }
    }

    /// Creates an independent node from this node's current values.
    pub fn child(&self) -> Result<Settings> {
        let snapshot = self.state.read()?.clone();
        Ok(Settings::from_state(snapshot))
    }

    /// Like `child`, but copies the last written values even if a writer panicked.
    pub(crate) fn fork(&self) -> Settings {
        let snapshot = match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Settings::from_state(snapshot)
    }

    /// Creates an independent node from this node's current values with keyword options
    /// applied on top. `replicaSet` is only accepted by clients.
    pub fn child_with_options(&self, options: &bson::Document) -> Result<Settings> {
        let options = NodeOptions::from_document(options)?;
        if options.replica_set.is_some() {
            return Err(ConfigurationError("replicaSet may only be set on a client.".to_owned()));
        }

        let mut snapshot = self.state.read()?.clone();
        snapshot.apply(&options)?;
        Ok(Settings::from_state(snapshot))
    }

    /// Sets `safe`, `slave_okay`, or a write concern option from a dynamic value.
    pub fn set_option(&self, key: &str, value: Bson) -> Result<()> {
        match key.to_ascii_lowercase().as_str() {
            "safe" => self.set_safe(validate_bool(key, &value)?),
            "slave_okay" | "slaveok" => self.set_slave_okay(validate_bool(key, &value)?),
            _ => self.write_concern().set(key, value),
        }
    }

    /// Returns the effective safe state.
    pub fn is_safe(&self) -> Result<bool> {
        Ok(self.state.read()?.is_safe())
    }

    /// Returns the raw `safe` flag, without considering declared write concern options.
    pub fn explicit_safe(&self) -> Result<bool> {
        Ok(self.state.read()?.explicit_safe)
    }

    pub fn set_safe(&self, safe: bool) -> Result<()> {
        self.state.write()?.explicit_safe = safe;
        Ok(())
    }

    pub fn slave_okay(&self) -> Result<bool> {
        Ok(self.state.read()?.slave_okay)
    }

    pub fn set_slave_okay(&self, slave_okay: bool) -> Result<()> {
        self.state.write()?.slave_okay = slave_okay;
        Ok(())
    }

    pub fn acknowledges(&self) -> Result<bool> {
        Ok(self.state.read()?.acknowledges())
    }

    /// Returns a live reference to this node's write concern.
    pub fn write_concern(&self) -> WriteConcernRef {
        WriteConcernRef::new(self.state.clone())
    }

    /// Replaces this node's write concern. The value must be a document.
    pub fn set_write_concern<V: Into<Bson>>(&self, value: V) -> Result<()> {
        self.write_concern().replace(value)
    }

    /// Returns a detached copy of this node's write concern options.
    pub fn lasterror_options(&self) -> Result<bson::Document> {
        self.write_concern().to_document()
    }

    /// Merges options into this node's write concern. Nothing is changed unless every
    /// key is valid.
    pub fn set_lasterror_options(&self, options: &bson::Document) -> Result<()> {
        let validated = WriteConcern::from_document(options)?;
        let mut guard = self.state.write()?;
        for (key, value) in validated.iter() {
            guard.set_concern(key.name(), value.clone())?;
        }
        Ok(())
    }

    /// Removes every write concern option. The `safe` flag is left untouched.
    pub fn unset_lasterror_options(&self) -> Result<()> {
        self.write_concern().clear()
    }

    /// Resolves the decision for a single write against this node's current state.
    pub fn resolve(&self, options: &WriteOptions) -> Result<Decision> {
        let guard = self.state.read()?;
        Ok(resolver::resolve(&guard, options))
    }

    /// Resolves the decision for a read against this node's current state.
    pub fn resolve_read(&self, slave_okay: Option<bool>) -> Result<Decision> {
        let guard = self.state.read()?;
        Ok(resolver::resolve_read(&guard, slave_okay))
    }
}
