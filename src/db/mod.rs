//! Interface for database-level operations.
use bson::{self, Bson};

use crate::coll::Collection;
use crate::resolver::WriteOptions;
use crate::settings::Settings;
use crate::transport::WriteOp;
use crate::{Client, CommandType, Result};

use std::sync::Arc;

/// Interfaces with a MongoDB database.
pub struct DatabaseInner {
    pub name: String,
    pub client: Client,
    settings: Settings,
}

pub type Database = Arc<DatabaseInner>;

pub trait ThreadedDatabase {
    /// Creates a database representation that owns `settings`.
    fn open(client: Client, name: &str, settings: Settings) -> Database;
    /// Creates a collection representation with the database's current settings.
    fn collection(&self, coll_name: &str) -> Collection;
    /// Creates a collection representation with keyword options applied on top of the
    /// database's current settings.
    fn collection_with_options(&self, coll_name: &str,
                               options: &bson::Document) -> Result<Collection>;
    /// Runs a command, acknowledged according to this database's settings and `options`.
    fn command(&self, spec: bson::Document,
               options: Option<WriteOptions>) -> Result<Option<bson::Document>>;
    fn drop_collection(&self, name: &str) -> Result<()>;
    fn settings(&self) -> &Settings;
}

impl ThreadedDatabase for Database {
    fn open(client: Client, name: &str, settings: Settings) -> Database {
        Arc::new(DatabaseInner {
            name: name.to_owned(),
            client,
            settings,
        })
    }

    fn collection(&self, coll_name: &str) -> Collection {
        Collection::new(self.clone(), coll_name, self.settings.fork())
    }

    fn collection_with_options(&self, coll_name: &str,
                               options: &bson::Document) -> Result<Collection> {
        let settings = self.settings.child_with_options(options)?;
        Ok(Collection::new(self.clone(), coll_name, settings))
    }

    fn command(&self, spec: bson::Document,
               options: Option<WriteOptions>) -> Result<Option<bson::Document>> {
        run_command(&self.client, &self.name, &self.settings, spec, options, CommandType::Command)
    }

    fn drop_collection(&self, name: &str) -> Result<()> {
        run_command(&self.client, &self.name, &self.settings, drop_spec(name), None,
                    CommandType::DropCollection)
            .map(|_| ())
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }
}

pub(crate) fn drop_spec(coll_name: &str) -> bson::Document {
    let mut spec = bson::Document::new();
    spec.insert("drop", Bson::String(coll_name.to_owned()));
    spec
}

/// Runs a command on `db_name`, acknowledged according to `settings`, which belong to the
/// object the command was invoked on.
pub(crate) fn run_command(client: &Client,
                          db_name: &str,
                          settings: &Settings,
                          spec: bson::Document,
                          options: Option<WriteOptions>,
                          cmd_type: CommandType)
                          -> Result<Option<bson::Document>> {
    let options = options.unwrap_or_else(WriteOptions::new);
    let decision = settings.resolve(&options)?;
    let namespace = format!("{}.$cmd", db_name);
    crate::dispatch_write(client, &namespace, cmd_type, &WriteOp::Command { spec }, &decision)
}
