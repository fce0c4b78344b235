//! Per-call resolution of write acknowledgment and read routing.
use bson::{self, Bson};
use serde_derive::Serialize;

use crate::common::{validate_bool, WriteConcernKey};
use crate::settings::SettingsState;
use crate::write_concern::WriteConcern;
use crate::Result;

/// Overrides supplied to a single operation. They are merged with the invoked node's
/// current settings and never stored on it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteOptions {
    pub safe: Option<bool>,
    /// Replaces the node's write concern for this call when non-empty.
    pub write_concern: WriteConcern,
    pub slave_okay: Option<bool>,
}

impl WriteOptions {
    pub fn new() -> WriteOptions {
        Default::default()
    }

    /// Overrides whether the call is acknowledged.
    pub fn safe(mut self, safe: bool) -> WriteOptions {
        self.safe = Some(safe);
        self
    }

    /// Adds a write concern override for this call.
    pub fn with<V: Into<Bson>>(mut self, key: &str, value: V) -> Result<WriteOptions> {
        self.write_concern.set(key, value)?;
        Ok(self)
    }

    /// Parses call overrides from keywords: `safe`, `slave_okay`, and write concern options.
    pub fn from_document(doc: &bson::Document) -> Result<WriteOptions> {
        let mut options = WriteOptions::new();

        for (key, value) in doc.iter() {
            match key.to_ascii_lowercase().as_str() {
                "safe" => options.safe = Some(validate_bool(key, value)?),
                "slave_okay" | "slaveok" => options.slave_okay = Some(validate_bool(key, value)?),
                _ => {
                    let concern_key = key.parse::<WriteConcernKey>()?;
                    options.write_concern.set_key(concern_key, value.clone())?;
                }
            }
        }

        Ok(options)
    }
}

/// The resolved, immutable settings for a single operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decision {
    acknowledge: bool,
    write_concern: WriteConcern,
    route_secondary_ok: bool,
}

impl Decision {
    /// Whether the caller waits for, and inspects, the server's acknowledgment.
    pub fn acknowledge(&self) -> bool {
        self.acknowledge
    }

    pub fn write_concern(&self) -> &WriteConcern {
        &self.write_concern
    }

    pub fn route_secondary_ok(&self) -> bool {
        self.route_secondary_ok
    }

    /// Builds the acknowledgment request sent after a write, or `None` if the write is
    /// fire-and-forget.
    pub fn get_last_error(&self) -> Option<bson::Document> {
        if !self.acknowledge {
            return None;
        }

        let mut cmd = bson::Document::new();
        cmd.insert("getlasterror", 1);
        for (key, value) in self.write_concern.iter() {
            cmd.insert(key.name(), value.clone());
        }
        Some(cmd)
    }
}

/// Resolves a write against a node's current state.
///
/// Without overrides the node's own settings apply, except that a stored `w=0` always means
/// no acknowledgment. An explicit `safe=false` disables acknowledgment; an explicit
/// `safe=true` reuses the node's write concern, or an empty one if the node stores `w=0`.
/// Any per-call write concern option replaces the node's document for this call and
/// requests acknowledgment unless it sets `w=0`, whatever `safe` says.
pub fn resolve(state: &SettingsState, options: &WriteOptions) -> Decision {
    let route_secondary_ok = resolve_routing(state, options.slave_okay);

    let (acknowledge, write_concern) = if !options.write_concern.is_empty() {
        (!options.write_concern.w_is_zero(), options.write_concern.clone())
    } else {
        match options.safe {
            Some(true) if state.write_concern.w_is_zero() => (true, WriteConcern::new()),
            Some(true) => (true, state.write_concern.clone()),
            Some(false) => (false, WriteConcern::new()),
            None if state.write_concern.w_is_zero() => (false, WriteConcern::new()),
            None if state.is_safe() => (true, state.write_concern.clone()),
            None => (false, WriteConcern::new()),
        }
    };

    Decision { acknowledge, write_concern, route_secondary_ok }
}

/// Resolves the decision for a read. Reads are never acknowledged; only routing applies.
pub fn resolve_read(state: &SettingsState, slave_okay: Option<bool>) -> Decision {
    Decision {
        acknowledge: false,
        write_concern: WriteConcern::new(),
        route_secondary_ok: resolve_routing(state, slave_okay),
    }
}

/// Resolves read routing: the explicit override if present, otherwise the node's flag.
pub fn resolve_routing(state: &SettingsState, slave_okay: Option<bool>) -> bool {
    slave_okay.unwrap_or(state.slave_okay)
}
