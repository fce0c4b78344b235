//! Lazily evaluated query results.

use crate::resolver::Decision;
use crate::settings::Settings;
use crate::wire_protocol::flags::OpQueryFlags;
use crate::coll::options::FindOptions;
use crate::{Client, CommandType, Result};

use std::collections::vec_deque::VecDeque;

/// Lazily returns documents from a query.
///
/// Read routing is resolved once, when the cursor is created, and every request the
/// cursor makes carries that snapshot. Changing the owning collection's `slave_okay`
/// afterwards has no effect on an existing cursor.
///
/// # Fields
///
/// `client` - The client to read from.
/// `cmd_type` - The operation reported to monitoring hooks.
/// `namespace` - The namespace to read from.
/// `filter` - The query filter.
/// `limit` - An upper bound on the number of documents returned; 0 means no limit.
/// `flags` - The query flags, including the routing snapshot.
/// `decision` - The routing decision reported to monitoring hooks.
/// `buffer` - Documents received that have not yet been returned.
/// `exhausted` - Whether the query has been sent.
pub struct Cursor {
    client: Client,
    cmd_type: CommandType,
    namespace: String,
    filter: bson::Document,
    limit: i32,
    flags: OpQueryFlags,
    decision: Decision,
    buffer: VecDeque<bson::Document>,
    exhausted: bool,
}

impl Cursor {
    /// Creates a cursor and captures its read routing from `settings`, unless `options`
    /// overrides it. No request is made until the first document is read.
    pub fn query(client: Client,
                 cmd_type: CommandType,
                 namespace: String,
                 filter: bson::Document,
                 options: &FindOptions,
                 settings: &Settings)
                 -> Result<Cursor> {
        let decision = settings.resolve_read(options.slave_okay)?;
        let flags = OpQueryFlags::with_find_options(options, decision.route_secondary_ok());

        Ok(Cursor {
            client,
            cmd_type,
            namespace,
            filter,
            limit: options.limit,
            flags,
            decision,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }

    /// Whether this cursor may read from secondaries.
    pub fn slave_okay(&self) -> bool {
        self.flags.slave_ok()
    }

    /// The flags every request from this cursor is sent with.
    pub fn flags(&self) -> OpQueryFlags {
        self.flags
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns true if there are more documents to read, sending the query if needed.
    pub fn has_next(&mut self) -> Result<bool> {
        self.fill_buffer()?;
        Ok(!self.buffer.is_empty())
    }

    /// Reads up to `n` documents.
    pub fn next_n(&mut self, n: usize) -> Result<Vec<bson::Document>> {
        let mut docs = Vec::new();
        while docs.len() < n {
            match self.next() {
                Some(Ok(doc)) => docs.push(doc),
                Some(Err(err)) => return Err(err),
                None => break,
            }
        }
        Ok(docs)
    }

    fn fill_buffer(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }

        let docs = crate::dispatch_query(&self.client,
                                         self.cmd_type,
                                         &self.namespace,
                                         &self.filter,
                                         self.limit,
                                         self.flags,
                                         &self.decision)?;
        self.exhausted = true;
        self.buffer.extend(docs);
        Ok(())
    }
}

impl Iterator for Cursor {
    type Item = Result<bson::Document>;

    fn next(&mut self) -> Option<Result<bson::Document>> {
        if let Err(err) = self.fill_buffer() {
            return Some(Err(err));
        }
        self.buffer.pop_front().map(Ok)
    }
}
