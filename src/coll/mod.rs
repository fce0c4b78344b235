//! Interface for collection-level operations.
pub mod error;
pub mod options;
pub mod results;

use bson::{self, oid, Bson};

use self::options::*;
use self::results::*;

use crate::cursor::Cursor;
use crate::db::{self, Database};
use crate::error::Error::ResponseError;
use crate::resolver::WriteOptions;
use crate::settings::Settings;
use crate::transport::WriteOp;
use crate::wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpUpdateFlags};
use crate::{CommandType, Result};

/// Interfaces with a MongoDB collection.
pub struct Collection {
    /// A reference to the database that spawned this collection.
    pub db: Database,
    /// The namespace of this collection, formatted as db_name.coll_name.
    pub namespace: String,
    settings: Settings,
}

impl Collection {
    /// Creates a collection representation that owns `settings`.
    pub fn new(db: Database, name: &str, settings: Settings) -> Collection {
        Collection {
            namespace: format!("{}.{}", db.name, name),
            db,
            settings,
        }
    }

    /// Extracts the collection name from the namespace.
    pub fn name(&self) -> String {
        match self.namespace.find('.') {
            Some(idx) => String::from(&self.namespace[idx + 1..]),
            None => self.namespace.to_owned(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Permanently deletes the collection from the database, acknowledged according to
    /// this collection's settings.
    pub fn drop(&self) -> Result<()> {
        db::run_command(&self.db.client,
                        &self.db.name,
                        &self.settings,
                        db::drop_spec(&self.name()),
                        None,
                        CommandType::DropCollection)
            .map(|_| ())
    }

    /// Returns a cursor over the documents that match the filter.
    ///
    /// Read routing is captured now; the query itself is sent on first iteration.
    pub fn find(&self,
                filter: Option<bson::Document>,
                options: Option<FindOptions>)
                -> Result<Cursor> {
        self.find_with_command_type(filter, options, CommandType::Find)
    }

    fn find_with_command_type(&self,
                              filter: Option<bson::Document>,
                              options: Option<FindOptions>,
                              cmd_type: CommandType)
                              -> Result<Cursor> {
        let find_options = options.unwrap_or_else(FindOptions::new);
        Cursor::query(self.db.client.clone(),
                      cmd_type,
                      self.namespace.to_owned(),
                      filter.unwrap_or_else(bson::Document::new),
                      &find_options,
                      &self.settings)
    }

    /// Returns the first document within the collection that matches the filter, or None.
    pub fn find_one(&self,
                    filter: Option<bson::Document>,
                    options: Option<FindOptions>)
                    -> Result<Option<bson::Document>> {
        let mut find_one_options = options.unwrap_or_default();
        find_one_options.limit = 1;

        let mut cursor = self.find_with_command_type(filter,
                                                     Some(find_one_options),
                                                     CommandType::FindOne)?;
        match cursor.next() {
            Some(Ok(doc)) => Ok(Some(doc)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    /// Inserts the provided documents, generating an `_id` for any that lack one.
    ///
    /// The ids are returned whether or not the insert was acknowledged.
    pub fn insert(&self, docs: Vec<bson::Document>, options: InsertOptions) -> Result<InsertResult> {
        let cmd_type = if docs.len() == 1 { CommandType::InsertOne } else { CommandType::Insert };
        self.insert_with_command_type(docs, options, cmd_type)
    }

    /// Inserts a single document.
    pub fn insert_one(&self, doc: bson::Document, options: WriteOptions) -> Result<InsertOneResult> {
        let result = self.insert_with_command_type(vec![doc],
                                                   InsertOptions::from(options),
                                                   CommandType::InsertOne)?;

        match result.inserted_ids.into_iter().next() {
            Some(inserted_id) => Ok(InsertOneResult { inserted_id, reply: result.reply }),
            None => Err(ResponseError(String::from("No id recorded for insert_one."))),
        }
    }

    fn insert_with_command_type(&self,
                                docs: Vec<bson::Document>,
                                options: InsertOptions,
                                cmd_type: CommandType)
                                -> Result<InsertResult> {
        let mut documents = Vec::with_capacity(docs.len());
        let mut ids = Vec::with_capacity(docs.len());

        for mut doc in docs {
            let id = match doc.get("_id") {
                Some(id) => id.clone(),
                None => {
                    let id = Bson::ObjectId(oid::ObjectId::new()?);
                    doc.insert("_id", id.clone());
                    id
                }
            };
            ids.push(id);
            documents.push(doc);
        }

        let op = WriteOp::Insert {
            documents,
            flags: OpInsertFlags::with_insert_options(&options),
        };

        let reply = self.write(cmd_type, &op, &options.write)?;
        Ok(InsertResult::new(ids, reply))
    }

    /// Updates documents matching the filter. Without `$set`, the matched document is
    /// replaced.
    pub fn update(&self,
                  filter: bson::Document,
                  update: bson::Document,
                  options: UpdateOptions)
                  -> Result<WriteResult> {
        let cmd_type = if options.multi { CommandType::Update } else { CommandType::UpdateOne };
        let op = WriteOp::Update {
            selector: filter,
            update,
            flags: OpUpdateFlags::with_update_options(&options),
        };

        self.write(cmd_type, &op, &options.write).map(WriteResult::new)
    }

    /// Removes documents matching the filter.
    pub fn remove(&self, filter: bson::Document, options: RemoveOptions) -> Result<WriteResult> {
        let cmd_type = if options.single { CommandType::RemoveOne } else { CommandType::Remove };
        let op = WriteOp::Remove {
            selector: filter,
            flags: OpDeleteFlags::with_remove_options(&options),
        };

        self.write(cmd_type, &op, &options.write).map(WriteResult::new)
    }

    // Resolves the decision against this collection's current settings, then dispatches
    // with the settings lock already released.
    fn write(&self,
             cmd_type: CommandType,
             op: &WriteOp,
             options: &WriteOptions)
             -> Result<Option<bson::Document>> {
        let decision = self.settings.resolve(options)?;
        crate::dispatch_write(&self.db.client, &self.namespace, cmd_type, op, &decision)
    }
}
