//! Write concern and read routing resolution for a MongoDB client.
//!
//! Every client, database, and collection carries its own settings: whether writes are
//! acknowledged ("safe"), which durability options accompany the acknowledgment request,
//! and whether reads may be routed to secondaries. A database copies its client's settings
//! when it is created, and a collection copies its database's; after that the levels are
//! independent. Each operation resolves an immutable `Decision` from the settings of the
//! object it was invoked on, merged with any per-call overrides, and hands it to the
//! transport.
//!
//! ```no_run
//! # use bson::{bson, doc};
//! # use std::sync::Arc;
//! use mongodb_concern::{Client, ClientOptions, ThreadedClient};
//! use mongodb_concern::db::ThreadedDatabase;
//! use mongodb_concern::resolver::WriteOptions;
//! use mongodb_concern::transport::MemoryTransport;
//!
//! let transport = Arc::new(MemoryTransport::standalone());
//! let client = Client::with_uri(transport, "mongodb://localhost/?w=1;journal=true",
//!                               ClientOptions::new()).unwrap();
//!
//! let coll = client.db("test").collection("movies");
//! coll.insert_one(doc! { "title": "Jaws" }, WriteOptions::new()).unwrap();
//! coll.insert_one(doc! { "title": "Alien" }, WriteOptions::new().safe(false)).unwrap();
//! ```
#[macro_use]
extern crate bitflags;

pub mod apm;
pub mod coll;
pub mod command_type;
pub mod common;
pub mod connstring;
pub mod cursor;
pub mod db;
pub mod error;
pub mod resolver;
pub mod settings;
pub mod transport;
pub mod wire_protocol;
pub mod write_concern;

pub use crate::apm::{CommandStarted, CommandResult};
pub use crate::command_type::CommandType;
pub use crate::error::{Error, Result};

use bson::{self, Bson};

use crate::apm::{CompletionHook, EventRunner, Listener, StartHook};
use crate::coll::error::LastError;
use crate::connstring::ConnectionString;
use crate::db::{Database, ThreadedDatabase};
use crate::error::Error::ConfigurationError;
use crate::resolver::Decision;
use crate::settings::{NodeOptions, Settings};
use crate::transport::{Transport, WriteOp};

use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};

/// Interfaces with a MongoDB server or replica set through a transport.
pub struct ClientInner {
    /// Indicates how a server should be connected to.
    pub config: ConnectionString,
    /// The replica set name the client was configured with, if any.
    pub replica_set: Option<String>,
    req_id: Arc<AtomicIsize>,
    transport: Arc<dyn Transport>,
    listener: Listener,
    settings: Settings,
}

/// Client-level configuration that is not carried by the connection string.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Appends every monitoring event to this file.
    pub log_file: Option<String>,
    /// The initial `safe` flag. Legacy connections start unacknowledged.
    pub acknowledge_by_default: bool,
    /// Fails construction unless a replica set name is configured.
    pub require_replica_set: bool,
    /// Keyword options; these take precedence over the connection string.
    pub options: bson::Document,
}

impl Default for ClientOptions {
    fn default() -> ClientOptions {
        ClientOptions {
            log_file: None,
            acknowledge_by_default: true,
            require_replica_set: false,
            options: bson::Document::new(),
        }
    }
}

impl ClientOptions {
    /// Creates options for a client that acknowledges writes unless told otherwise.
    pub fn new() -> ClientOptions {
        Default::default()
    }

    /// Creates options for a legacy connection, which only acknowledges writes on request.
    pub fn legacy() -> ClientOptions {
        ClientOptions { acknowledge_by_default: false, ..Default::default() }
    }

    /// Creates options that append monitoring events to a file.
    pub fn with_log_file(file: &str) -> ClientOptions {
        ClientOptions { log_file: Some(String::from(file)), ..Default::default() }
    }

    /// Adds a keyword option.
    pub fn option<V: Into<Bson>>(mut self, key: &str, value: V) -> ClientOptions {
        self.options.insert(key, value);
        self
    }
}

pub type Client = Arc<ClientInner>;

pub trait ThreadedClient: Sync + Sized {
    /// Creates a new Client for a single MongoDB server.
    fn connect(transport: Arc<dyn Transport>, host: &str, port: u16,
               options: ClientOptions) -> Result<Self>;
    /// Creates a new Client from a MongoDB connection string URI as defined by
    /// [the manual](http://docs.mongodb.org/manual/reference/connection-string/).
    fn with_uri(transport: Arc<dyn Transport>, uri: &str, options: ClientOptions) -> Result<Self>;
    fn with_config(transport: Arc<dyn Transport>, config: ConnectionString,
                   options: ClientOptions) -> Result<Self>;
    /// Creates a database representation with the client's current settings.
    fn db(&self, db_name: &str) -> Database;
    /// Creates a database representation with keyword options applied on top of the
    /// client's current settings.
    fn db_with_options(&self, db_name: &str, options: &bson::Document) -> Result<Database>;
    fn get_req_id(&self) -> i32;
    fn settings(&self) -> &Settings;
    fn add_start_hook(&self, hook: StartHook) -> Result<()>;
    fn add_completion_hook(&self, hook: CompletionHook) -> Result<()>;
}

impl ThreadedClient for Client {
    fn connect(transport: Arc<dyn Transport>, host: &str, port: u16,
               options: ClientOptions) -> Result<Client> {
        let config = ConnectionString::new(host, port);
        Client::with_config(transport, config, options)
    }

    fn with_uri(transport: Arc<dyn Transport>, uri: &str, options: ClientOptions) -> Result<Client> {
        let config = connstring::parse(uri)?;
        Client::with_config(transport, config, options)
    }

    fn with_config(transport: Arc<dyn Transport>, config: ConnectionString,
                   options: ClientOptions) -> Result<Client> {
        let mut node_options = config.node_options()?;
        node_options.merge(NodeOptions::from_document(&options.options)?);

        validate_replica_set(transport.as_ref(),
                             node_options.replica_set.as_ref(),
                             options.require_replica_set)?;

        let settings = Settings::with_options(options.acknowledge_by_default, &node_options)?;

        let listener = match options.log_file {
            Some(ref path) => Listener::with_log_file(path)?,
            None => Listener::new(),
        };

        Ok(Arc::new(ClientInner {
            config,
            replica_set: node_options.replica_set,
            req_id: Arc::new(AtomicIsize::new(0)),
            transport,
            listener,
            settings,
        }))
    }

    fn db(&self, db_name: &str) -> Database {
        Database::open(self.clone(), db_name, self.settings.fork())
    }

    fn db_with_options(&self, db_name: &str, options: &bson::Document) -> Result<Database> {
        let settings = self.settings.child_with_options(options)?;
        Ok(Database::open(self.clone(), db_name, settings))
    }

    fn get_req_id(&self) -> i32 {
        self.req_id.fetch_add(1, Ordering::SeqCst) as i32
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn add_start_hook(&self, hook: StartHook) -> Result<()> {
        self.listener.add_start_hook(hook)
    }

    fn add_completion_hook(&self, hook: CompletionHook) -> Result<()> {
        self.listener.add_completion_hook(hook)
    }
}

fn validate_replica_set(transport: &dyn Transport,
                        name: Option<&String>,
                        required: bool)
                        -> Result<()> {
    let name = match name {
        Some(name) => name,
        None if required => {
            return Err(ConfigurationError("A replicaSet name is required to connect to a \
                                           replica set."
                .to_owned()))
        }
        None => return Ok(()),
    };

    match transport.replica_set_name() {
        Some(ref actual) if actual == name => Ok(()),
        Some(actual) => {
            Err(ConfigurationError(format!("replicaSet {} does not match the connected set {}.",
                                           name,
                                           actual)))
        }
        None => {
            Err(ConfigurationError(format!("replicaSet {} was given, but the server is not a \
                                            member of a replica set.",
                                           name)))
        }
    }
}

macro_rules! try_or_emit {
    ($cmd_name:expr, $req_id:expr, $connstring:expr, $result:expr, $client:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => {
                let hook_result = $client.run_completion_hooks(&CommandResult::Failure {
                    duration: 0,
                    command_name: $cmd_name.to_owned(),
                    failure: &e,
                    request_id: $req_id as i64,
                    connection_string: $connstring,
                });

                return match hook_result {
                    Ok(_) => Err(e),
                    Err(_) => Err(Error::EventListenerError(Some(Box::new(e)))),
                };
            }
        }
    };
}

// Emits the started event for an operation, mapping hook failures.
fn emit_started(client: &Client, started: &CommandStarted) -> Result<()> {
    client.run_start_hooks(started).map_err(|_| Error::EventListenerError(None))
}

/// Sends a write to the transport with an already-resolved decision.
///
/// Monitoring events are emitted around the call. The reply is returned only when the
/// decision acknowledges; a reported error then becomes an `OperationFailure`.
pub(crate) fn dispatch_write(client: &Client,
                             namespace: &str,
                             cmd_type: CommandType,
                             op: &WriteOp,
                             decision: &Decision)
                             -> Result<Option<bson::Document>> {
    let req_id = client.get_req_id();
    let (db_name, coll_name) = split_namespace(namespace);
    let cmd_name = cmd_type.to_str();
    let connstring = client.config.label();

    emit_started(client,
                 &CommandStarted {
                     command: op.to_command(coll_name),
                     database_name: db_name.to_owned(),
                     command_name: cmd_name.to_owned(),
                     request_id: req_id as i64,
                     connection_string: connstring.clone(),
                     decision: decision.clone(),
                 })?;

    let init_time = time::precise_time_ns();

    let reply = try_or_emit!(cmd_name,
                             req_id,
                             connstring,
                             client.transport.write(namespace, op, decision),
                             client);

    let fin_time = time::precise_time_ns();

    let validated = try_or_emit!(cmd_name,
                                 req_id,
                                 connstring,
                                 LastError::validate_write_result(reply.clone(), decision),
                                 client);

    let _hook_result = client.run_completion_hooks(&CommandResult::Success {
        duration: fin_time - init_time,
        reply,
        command_name: cmd_name.to_owned(),
        request_id: req_id as i64,
        connection_string: connstring,
    });

    Ok(validated)
}

/// Runs a query against the transport, emitting monitoring events around it.
pub(crate) fn dispatch_query(client: &Client,
                             cmd_type: CommandType,
                             namespace: &str,
                             filter: &bson::Document,
                             limit: i32,
                             flags: wire_protocol::flags::OpQueryFlags,
                             decision: &Decision)
                             -> Result<Vec<bson::Document>> {
    let req_id = client.get_req_id();
    let (db_name, _) = split_namespace(namespace);
    let cmd_name = cmd_type.to_str();
    let connstring = client.config.label();

    emit_started(client,
                 &CommandStarted {
                     command: filter.clone(),
                     database_name: db_name.to_owned(),
                     command_name: cmd_name.to_owned(),
                     request_id: req_id as i64,
                     connection_string: connstring.clone(),
                     decision: decision.clone(),
                 })?;

    let init_time = time::precise_time_ns();

    let docs = try_or_emit!(cmd_name,
                            req_id,
                            connstring,
                            client.transport.query(namespace, filter, limit, flags),
                            client);

    let fin_time = time::precise_time_ns();

    let mut reply = bson::Document::new();
    reply.insert("ok", 1);
    reply.insert("n", docs.len() as i32);

    let _hook_result = client.run_completion_hooks(&CommandResult::Success {
        duration: fin_time - init_time,
        reply,
        command_name: cmd_name.to_owned(),
        request_id: req_id as i64,
        connection_string: connstring,
    });

    Ok(docs)
}

fn split_namespace(namespace: &str) -> (&str, &str) {
    match namespace.find('.') {
        Some(idx) => (&namespace[..idx], &namespace[idx + 1..]),
        None => (namespace, ""),
    }
}
