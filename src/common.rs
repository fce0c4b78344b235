//! Option vocabulary shared by every settings level.
use bson::Bson;

use crate::error::Error::{ConfigurationError, TypeError};
use crate::Result;

use std::fmt;
use std::str::FromStr;

/// A recognized write concern option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteConcernKey {
    /// Write replication; a count of nodes or a named mode such as "majority".
    W,
    /// Used in conjunction with `w`. Propagation timeout in ms.
    WTimeout,
    /// If true and the server is not journaling, blocks until data files are synced.
    FSync,
    /// If true, blocks until write operations have been committed to the journal.
    Journal,
}

impl WriteConcernKey {
    /// Returns the canonical document key.
    pub fn name(&self) -> &'static str {
        match *self {
            WriteConcernKey::W => "w",
            WriteConcernKey::WTimeout => "wtimeout",
            WriteConcernKey::FSync => "fsync",
            WriteConcernKey::Journal => "j",
        }
    }

    /// Validates a value for this key, normalizing integers to 32 bits.
    pub fn validate(&self, value: Bson) -> Result<Bson> {
        match (*self, value) {
            (WriteConcernKey::W, Bson::String(mode)) => {
                if mode.is_empty() {
                    Err(ConfigurationError("w must not be an empty string.".to_owned()))
                } else {
                    Ok(Bson::String(mode))
                }
            }
            (WriteConcernKey::W, value) | (WriteConcernKey::WTimeout, value) => {
                non_negative_i32(self.name(), &value).map(Bson::I32)
            }
            (_, Bson::Boolean(b)) => Ok(Bson::Boolean(b)),
            (key, other) => Err(ConfigurationError(format!("{} must be a boolean, not {}.",
                                                           key.name(), other))),
        }
    }

    /// Converts a connection string value into a validated BSON value.
    pub fn parse_value(&self, raw: &str) -> Result<Bson> {
        match *self {
            WriteConcernKey::W => match raw.parse::<i32>() {
                Ok(n) => self.validate(Bson::I32(n)),
                Err(_) => self.validate(Bson::String(raw.to_owned())),
            },
            WriteConcernKey::WTimeout => match raw.parse::<i32>() {
                Ok(n) => self.validate(Bson::I32(n)),
                Err(_) => Err(ConfigurationError(format!("wtimeout must be an integer, not '{}'.",
                                                         raw))),
            },
            WriteConcernKey::FSync | WriteConcernKey::Journal => {
                parse_bool(self.name(), raw).map(Bson::Boolean)
            }
        }
    }
}

impl FromStr for WriteConcernKey {
    type Err = crate::Error;

    /// Normalizes aliases (`wtimeoutMS`, `journal`) case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "w" => Ok(WriteConcernKey::W),
            "wtimeout" | "wtimeoutms" => Ok(WriteConcernKey::WTimeout),
            "fsync" => Ok(WriteConcernKey::FSync),
            "j" | "journal" => Ok(WriteConcernKey::Journal),
            _ => Err(ConfigurationError(format!("{} is not a valid write concern option.", s))),
        }
    }
}

impl fmt::Display for WriteConcernKey {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// Parses a boolean option literal. Only "true" and "false" are accepted, in any case.
pub fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigurationError(format!("The value of {} must be 'true' or 'false', not '{}'.",
                                       key, raw)))
    }
}

/// Validates a flag set from a dynamic value, such as `safe` or `slave_okay`.
pub fn validate_bool(key: &str, value: &Bson) -> Result<bool> {
    match *value {
        Bson::Boolean(b) => Ok(b),
        ref other => Err(TypeError(format!("{} must be True or False, not {}.", key, other))),
    }
}

fn non_negative_i32(key: &str, value: &Bson) -> Result<i32> {
    let n = match *value {
        Bson::I32(n) => i64::from(n),
        Bson::I64(n) => n,
        ref other => {
            return Err(ConfigurationError(format!("{} must be an integer, not {}.", key, other)))
        }
    };

    if n < 0 || n > i64::from(i32::max_value()) {
        return Err(ConfigurationError(format!("{} must be a non-negative 32-bit integer, not {}.",
                                              key, n)));
    }

    Ok(n as i32)
}
