//! Connection string parsing.
//!
//! Besides hosts and credentials, a connection string carries settings in its query string.
//! Write concern options, `slaveOk`, `safe`, and `replicaSet` are interpreted; any other
//! option is kept as-is and otherwise ignored.
use crate::common::{parse_bool, WriteConcernKey};
use crate::error::Error::{ArgumentError, ConfigurationError};
use crate::settings::NodeOptions;
use crate::Result;

use std::collections::BTreeMap;

pub const DEFAULT_PORT: u16 = 27017;
pub const URI_SCHEME: &str = "mongodb://";

/// Encapsulates the hostname and port of a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
    pub host_name: String,
    pub ipc: String,
    pub port: u16,
}

impl Host {
    fn new(host_name: String, port: u16) -> Host {
        Host { host_name, port, ipc: String::new() }
    }

    fn with_ipc(ipc: String) -> Host {
        Host { host_name: String::new(), port: DEFAULT_PORT, ipc }
    }

    pub fn has_ipc(&self) -> bool {
        !self.ipc.is_empty()
    }
}

/// The raw options and read preference tags of a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub options: BTreeMap<String, String>,
    pub read_pref_tags: Vec<String>,
}

impl ConnectionOptions {
    pub fn new(options: BTreeMap<String, String>, read_pref_tags: Vec<String>) -> ConnectionOptions {
        ConnectionOptions { options, read_pref_tags }
    }

    /// Looks up an option by name, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.iter()
            .find(|&(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Interprets the settings carried by these options.
    ///
    /// Flags and write concern values are validated; unknown options are skipped.
    pub fn node_options(&self) -> Result<NodeOptions> {
        let mut node_options = NodeOptions::new();

        for (key, value) in &self.options {
            match key.to_ascii_lowercase().as_str() {
                "slaveok" => node_options.slave_okay = Some(parse_bool(key, value)?),
                "safe" => node_options.safe = Some(parse_bool(key, value)?),
                "replicaset" => {
                    if value.is_empty() {
                        return Err(ConfigurationError("replicaSet must be a non-empty string."
                            .to_owned()));
                    }
                    node_options.replica_set = Some(value.to_owned());
                }
                name => {
                    if let Ok(concern_key) = name.parse::<WriteConcernKey>() {
                        let concern_value = concern_key.parse_value(value)?;
                        node_options.write_concern.set_key(concern_key, concern_value)?;
                    }
                }
            }
        }

        Ok(node_options)
    }
}

/// Encapsulates information for connection to a single MongoDB host or replicated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub hosts: Vec<Host>,
    pub string: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub options: Option<ConnectionOptions>,
}

impl ConnectionString {
    /// Creates a new ConnectionString for a single, unreplicated host.
    pub fn new(host_name: &str, port: u16) -> ConnectionString {
        ConnectionString {
            hosts: vec![Host::new(host_name.to_ascii_lowercase(), port)],
            string: None,
            user: None,
            password: None,
            database: Some("test".to_owned()),
            collection: None,
            options: None,
        }
    }

    /// Interprets the settings in the query string, if there is one.
    pub fn node_options(&self) -> Result<NodeOptions> {
        match self.options {
            Some(ref options) => options.node_options(),
            None => Ok(NodeOptions::new()),
        }
    }

    /// A printable form used to label monitoring events.
    pub fn label(&self) -> String {
        match self.string {
            Some(ref string) => string.to_owned(),
            None => {
                let hosts: Vec<String> = self.hosts
                    .iter()
                    .map(|host| if host.has_ipc() {
                        host.ipc.to_owned()
                    } else {
                        format!("{}:{}", host.host_name, host.port)
                    })
                    .collect();
                format!("{}{}", URI_SCHEME, hosts.join(","))
            }
        }
    }
}

/// Parses a MongoDB connection string URI as defined by
/// [the manual](http://docs.mongodb.org/manual/reference/connection-string/).
pub fn parse(address: &str) -> Result<ConnectionString> {
    if !address.starts_with(URI_SCHEME) {
        return Err(ArgumentError("MongoDB connection string must start with 'mongodb://'."
            .to_owned()));
    }

    // Remove scheme
    let addr = &address[URI_SCHEME.len()..];

    let mut user = None;
    let mut password = None;
    let mut database = Some("test".to_owned());
    let mut collection = None;
    let mut options = None;

    // Split on host/path
    let (host_str, path_str) = if addr.contains(".sock") {
        // Partition ipc socket
        let (host_part, path_part) = rsplit(addr, ".sock");
        if path_part.starts_with('/') {
            (host_part, &path_part[1..])
        } else {
            (host_part, path_part)
        }
    } else {
        // Partition standard format
        partition(addr, "/")
    };

    if path_str.is_empty() && host_str.contains('?') {
        return Err(ArgumentError("A '/' is required between the host list and any options."
            .to_owned()));
    }

    // Split on authentication and hosts
    let hosts = if host_str.contains('@') {
        let (user_info, host_string) = rpartition(host_str, "@");
        let (u, p) = parse_user_info(user_info)?;
        user = Some(u.to_owned());
        password = Some(p.to_owned());
        split_hosts(host_string)?
    } else {
        split_hosts(host_str)?
    };

    let mut opts = "";

    // Split on database name, collection, and options
    if !path_str.is_empty() {
        if path_str.starts_with('?') {
            opts = &path_str[1..];
        } else {
            let (dbase, options) = partition(path_str, "?");
            let (dbase_new, coll) = partition(dbase, ".");
            if !dbase_new.is_empty() {
                database = Some(dbase_new.to_owned());
            }
            if !coll.is_empty() {
                collection = Some(coll.to_owned());
            }
            opts = options;
        }
    }

    // Collect options if any exist
    if !opts.is_empty() {
        options = Some(split_options(opts)?);
    }

    Ok(ConnectionString {
        hosts,
        string: Some(address.to_owned()),
        user,
        password,
        database,
        collection,
        options,
    })
}

// Parse user information of the form user:password
fn parse_user_info(user_info: &str) -> Result<(&str, &str)> {
    let (user, password) = rpartition(user_info, ":");
    if user_info.contains('@') || user.contains(':') {
        return Err(ArgumentError("':' or '@' characters in a username or password must be \
                                  escaped according to RFC 2396."
            .to_owned()));
    }
    if user.is_empty() {
        return Err(ArgumentError("The empty string is not a valid username.".to_owned()));
    }
    Ok((user, password))
}

// Parses a literal IPv6 literal host entity of the form [host] or [host]:port
fn parse_ipv6_literal_host(entity: &str) -> Result<Host> {
    match entity.find(']') {
        Some(end) => match entity.find("]:") {
            Some(idx) => {
                let port = &entity[idx + 2..];
                match port.parse::<u16>() {
                    Ok(val) => Ok(Host::new(entity[1..idx].to_ascii_lowercase(), val)),
                    Err(_) => Err(ArgumentError("Port must be an integer.".to_owned())),
                }
            }
            None => Ok(Host::new(entity[1..end].to_ascii_lowercase(), DEFAULT_PORT)),
        },
        None => Err(ArgumentError("An IPv6 address must be enclosed in '[' and ']' according \
                                   to RFC 2732."
            .to_owned())),
    }
}

/// Parses a host entity of the form host or host:port, and redirects IPv6 entities.
/// All host names are lowercased.
pub fn parse_host(entity: &str) -> Result<Host> {
    if entity.starts_with('[') {
        // IPv6 host
        parse_ipv6_literal_host(entity)
    } else if entity.contains(':') {
        // Common host:port format
        let (host, port) = partition(entity, ":");
        if port.contains(':') {
            return Err(ArgumentError("Reserved characters such as ':' must be escaped \
                                      according to RFC 2396. An IPv6 address literal must be \
                                      enclosed in '[' and according to RFC 2732."
                .to_owned()));
        }
        match port.parse::<u16>() {
            Ok(val) => Ok(Host::new(host.to_ascii_lowercase(), val)),
            Err(_) => Err(ArgumentError("Port must be an unsigned integer.".to_owned())),
        }
    } else if entity.contains(".sock") {
        // IPC socket
        Ok(Host::with_ipc(entity.to_ascii_lowercase()))
    } else {
        // Host with no port specified
        Ok(Host::new(entity.to_ascii_lowercase(), DEFAULT_PORT))
    }
}

// Splits and parses comma-separated hosts.
fn split_hosts(host_str: &str) -> Result<Vec<Host>> {
    let mut hosts = Vec::new();
    for entity in host_str.split(',') {
        if entity.is_empty() {
            return Err(ArgumentError("Empty host, or extra comma in host list.".to_owned()));
        }
        hosts.push(parse_host(entity)?);
    }
    Ok(hosts)
}

// Parses the delimited string into its options and Read Preference Tags.
fn parse_options(opts: &str, delim: Option<&str>) -> ConnectionOptions {
    let mut options = BTreeMap::new();
    let mut read_pref_tags = Vec::new();

    // Split and collect options into a vec
    let opt_list: Vec<&str> = match delim {
        Some(delim) => opts.split(delim).filter(|opt| !opt.is_empty()).collect(),
        None => vec![opts],
    };

    // Build the map and tag vec
    for opt in opt_list {
        let (key, val) = partition(opt, "=");
        if key.eq_ignore_ascii_case("readpreferencetags") {
            read_pref_tags.push(val.to_owned());
        } else {
            options.insert(key.to_owned(), val.to_owned());
        }
    }

    ConnectionOptions::new(options, read_pref_tags)
}

// Determines the option delimiter and offloads parsing to parse_options.
fn split_options(opts: &str) -> Result<ConnectionOptions> {
    let and_idx = opts.find('&');
    let semi_idx = opts.find(';');
    let mut delim = None;

    if and_idx.is_some() && semi_idx.is_some() {
        return Err(ArgumentError("Cannot mix '&' and ';' for option separators.".to_owned()));
    } else if and_idx.is_some() {
        delim = Some("&");
    } else if semi_idx.is_some() {
        delim = Some(";");
    } else if !opts.contains('=') {
        return Err(ArgumentError("InvalidURI: MongoDB URI options are key=value pairs."
            .to_owned()));
    }
    Ok(parse_options(opts, delim))
}

// Partitions a string around the left-most occurrence of the separator, if it exists.
fn partition<'a>(string: &'a str, sep: &str) -> (&'a str, &'a str) {
    match string.find(sep) {
        Some(idx) => (&string[..idx], &string[idx + sep.len()..]),
        None => (string, ""),
    }
}

// Partitions a string around the right-most occurrence of the separator, if it exists.
fn rpartition<'a>(string: &'a str, sep: &str) -> (&'a str, &'a str) {
    match string.rfind(sep) {
        Some(idx) => (&string[..idx], &string[idx + sep.len()..]),
        None => (string, ""),
    }
}

// Splits a string around the right-most occurrence of the separator, if it exists.
fn rsplit<'a>(string: &'a str, sep: &str) -> (&'a str, &'a str) {
    match string.rfind(sep) {
        Some(idx) => (&string[..idx + sep.len()], &string[idx + sep.len()..]),
        None => (string, ""),
    }
}
