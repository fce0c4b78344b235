//! The boundary between settings resolution and the wire.
//!
//! A `Transport` receives each operation together with the `Decision` resolved for it and
//! returns the server's reply. Whether a reported error reaches the caller is decided on
//! this side of the boundary, from the decision alone.
use bson::{self, Bson};

use crate::error::{DUPLICATE_KEY, UNKNOWN_REPL_WRITE_CONCERN, WRITE_CONCERN_TIMEOUT};
use crate::resolver::Decision;
use crate::wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpUpdateFlags};
use crate::Result;

use std::collections::HashMap;
use std::sync::Mutex;

/// A write operation on a namespace.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Insert { documents: Vec<bson::Document>, flags: OpInsertFlags },
    Update { selector: bson::Document, update: bson::Document, flags: OpUpdateFlags },
    Remove { selector: bson::Document, flags: OpDeleteFlags },
    Command { spec: bson::Document },
}

impl WriteOp {
    /// Describes the operation as a command document, for monitoring.
    pub fn to_command(&self, collection: &str) -> bson::Document {
        let mut doc = bson::Document::new();
        match *self {
            WriteOp::Insert { ref documents, flags } => {
                doc.insert("insert", collection);
                let docs: Vec<Bson> = documents.iter().cloned().map(Bson::Document).collect();
                doc.insert("documents", docs);
                doc.insert("ordered", !flags.contains(OpInsertFlags::CONTINUE_ON_ERROR));
            }
            WriteOp::Update { ref selector, ref update, flags } => {
                doc.insert("update", collection);
                doc.insert("q", selector.clone());
                doc.insert("u", update.clone());
                doc.insert("upsert", flags.contains(OpUpdateFlags::UPSERT));
                doc.insert("multi", flags.contains(OpUpdateFlags::MULTI_UPDATE));
            }
            WriteOp::Remove { ref selector, flags } => {
                doc.insert("delete", collection);
                doc.insert("q", selector.clone());
                let limit = if flags.contains(OpDeleteFlags::SINGLE_REMOVE) { 1 } else { 0 };
                doc.insert("limit", limit);
            }
            WriteOp::Command { ref spec } => return spec.clone(),
        }
        doc
    }
}

/// The external collaborator that actually talks to a server or replica set.
pub trait Transport: Send + Sync {
    /// Sends a write and returns the server's acknowledgment document. The reply is only
    /// inspected when `decision` acknowledges.
    fn write(&self, namespace: &str, op: &WriteOp, decision: &Decision) -> Result<bson::Document>;

    /// Runs a query. `limit` of 0 means no limit.
    fn query(&self,
             namespace: &str,
             filter: &bson::Document,
             limit: i32,
             flags: OpQueryFlags)
             -> Result<Vec<bson::Document>>;

    /// The replica set name reported by the topology, if it is a replica set.
    fn replica_set_name(&self) -> Option<String>;
}

/// An in-process stand-in for a server or replica set.
///
/// Documents are kept per namespace and `_id` is unique. Acknowledged writes are followed
/// by the decision's `getlasterror` request, which is checked against the topology: a
/// numeric `w` greater than the number of members times out, and named modes other than
/// "majority" are reported as unknown. Every decision, acknowledgment request, and query
/// flag vector it receives is recorded for inspection.
pub struct MemoryTransport {
    set_name: Option<String>,
    members: i32,
    data: Mutex<HashMap<String, Vec<bson::Document>>>,
    decisions: Mutex<Vec<Decision>>,
    last_errors: Mutex<Vec<bson::Document>>,
    query_flags: Mutex<Vec<OpQueryFlags>>,
}

impl MemoryTransport {
    /// A single, unreplicated server.
    pub fn standalone() -> MemoryTransport {
        MemoryTransport::new(None, 1)
    }

    /// A replica set with the given name and number of data-bearing members.
    pub fn replica_set(name: &str, members: i32) -> MemoryTransport {
        MemoryTransport::new(Some(name.to_owned()), members)
    }

    fn new(set_name: Option<String>, members: i32) -> MemoryTransport {
        MemoryTransport {
            set_name,
            members,
            data: Mutex::new(HashMap::new()),
            decisions: Mutex::new(Vec::new()),
            last_errors: Mutex::new(Vec::new()),
            query_flags: Mutex::new(Vec::new()),
        }
    }

    /// Every decision received so far, oldest first.
    pub fn decisions(&self) -> Result<Vec<Decision>> {
        Ok(self.decisions.lock()?.clone())
    }

    /// The decision received by the most recent write.
    pub fn last_decision(&self) -> Result<Option<Decision>> {
        Ok(self.decisions.lock()?.last().cloned())
    }

    /// Every `getlasterror` request that followed a write, oldest first.
    pub fn last_error_commands(&self) -> Result<Vec<bson::Document>> {
        Ok(self.last_errors.lock()?.clone())
    }

    /// The flags of every query received so far, oldest first.
    pub fn query_flags(&self) -> Result<Vec<OpQueryFlags>> {
        Ok(self.query_flags.lock()?.clone())
    }

    /// The number of documents stored in a namespace.
    pub fn count(&self, namespace: &str) -> Result<usize> {
        Ok(self.data.lock()?.get(namespace).map_or(0, Vec::len))
    }

    fn apply(&self, namespace: &str, op: &WriteOp) -> Result<(i32, Option<(i32, String)>)> {
        let mut data = self.data.lock()?;

        match *op {
            WriteOp::Insert { ref documents, flags } => {
                let coll = data.entry(namespace.to_owned()).or_insert_with(Vec::new);
                let mut n = 0;
                let mut error = None;

                for doc in documents {
                    let id = doc.get("_id");
                    if id.is_some() && coll.iter().any(|existing| existing.get("_id") == id) {
                        error = Some((DUPLICATE_KEY,
                                      format!("E11000 duplicate key error index: {}.$_id_ \
                                               dup key: {{ : {} }}",
                                              namespace,
                                              id.map(ToString::to_string).unwrap_or_default())));
                        if flags.contains(OpInsertFlags::CONTINUE_ON_ERROR) {
                            continue;
                        }
                        break;
                    }
                    coll.push(doc.clone());
                    n += 1;
                }

                Ok((n, error))
            }
            WriteOp::Update { ref selector, ref update, flags } => {
                let coll = data.entry(namespace.to_owned()).or_insert_with(Vec::new);
                let multi = flags.contains(OpUpdateFlags::MULTI_UPDATE);
                let mut n = 0;

                for doc in coll.iter_mut().filter(|doc| matches(doc, selector)) {
                    apply_update(doc, update);
                    n += 1;
                    if !multi {
                        break;
                    }
                }

                if n == 0 && flags.contains(OpUpdateFlags::UPSERT) {
                    let mut doc = selector.clone();
                    apply_update(&mut doc, update);
                    coll.push(doc);
                    n = 1;
                }

                Ok((n, None))
            }
            WriteOp::Remove { ref selector, flags } => {
                let coll = data.entry(namespace.to_owned()).or_insert_with(Vec::new);
                let single = flags.contains(OpDeleteFlags::SINGLE_REMOVE);
                let before = coll.len();

                if single {
                    if let Some(idx) = coll.iter().position(|doc| matches(doc, selector)) {
                        coll.remove(idx);
                    }
                } else {
                    coll.retain(|doc| !matches(doc, selector));
                }

                Ok(((before - coll.len()) as i32, None))
            }
            WriteOp::Command { ref spec } => {
                let db = namespace.split('.').next().unwrap_or("");
                match spec.iter().next() {
                    Some((name, &Bson::String(ref coll))) if name == "drop" => {
                        let removed = data.remove(&format!("{}.{}", db, coll));
                        Ok((removed.map_or(0, |docs| docs.len() as i32), None))
                    }
                    Some((name, _)) if name == "ping" => Ok((0, None)),
                    Some((name, _)) => {
                        Ok((0, Some((59, format!("no such cmd: {}", name)))))
                    }
                    None => Ok((0, Some((59, String::from("empty command"))))),
                }
            }
        }
    }

    fn check_write_concern(&self, last_error: &bson::Document) -> Option<(i32, String)> {
        match last_error.get("w") {
            Some(&Bson::I32(w)) if w > self.members => {
                Some((WRITE_CONCERN_TIMEOUT, String::from("timeout")))
            }
            Some(&Bson::String(ref mode)) if mode != "majority" => {
                Some((UNKNOWN_REPL_WRITE_CONCERN,
                      format!("unrecognized getLastError mode: {}", mode)))
            }
            _ => None,
        }
    }
}

impl Transport for MemoryTransport {
    fn write(&self, namespace: &str, op: &WriteOp, decision: &Decision) -> Result<bson::Document> {
        self.decisions.lock()?.push(decision.clone());

        let last_error = decision.get_last_error();
        if let Some(ref cmd) = last_error {
            self.last_errors.lock()?.push(cmd.clone());
        }

        let (n, write_error) = self.apply(namespace, op)?;
        let is_command = match *op {
            WriteOp::Command { .. } => true,
            _ => false,
        };

        let mut reply = bson::Document::new();

        match write_error {
            Some((code, message)) if is_command => {
                reply.insert("ok", 0);
                reply.insert("errmsg", message);
                reply.insert("code", code);
            }
            Some((code, message)) => {
                reply.insert("ok", 1);
                reply.insert("n", n);
                reply.insert("err", message);
                reply.insert("code", code);
            }
            None => {
                reply.insert("ok", 1);
                reply.insert("n", n);
                match last_error.as_ref().and_then(|cmd| self.check_write_concern(cmd)) {
                    Some((code, message)) => {
                        reply.insert("err", message);
                        reply.insert("code", code);
                        reply.insert("wtimeout", code == WRITE_CONCERN_TIMEOUT);
                    }
                    None => {
                        reply.insert("err", Bson::Null);
                    }
                }
            }
        }

        Ok(reply)
    }

    fn query(&self,
             namespace: &str,
             filter: &bson::Document,
             limit: i32,
             flags: OpQueryFlags)
             -> Result<Vec<bson::Document>> {
        self.query_flags.lock()?.push(flags);

        let data = self.data.lock()?;
        let docs = match data.get(namespace) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };

        let matching = docs.iter().filter(|doc| matches(doc, filter)).cloned();
        Ok(if limit > 0 {
            matching.take(limit as usize).collect()
        } else {
            matching.collect()
        })
    }

    fn replica_set_name(&self) -> Option<String> {
        self.set_name.clone()
    }
}

// Top-level equality match; an empty selector matches everything.
fn matches(doc: &bson::Document, selector: &bson::Document) -> bool {
    selector.iter().all(|(key, value)| doc.get(key) == Some(value))
}

// Applies `$set` if present, otherwise replaces every field but `_id`.
fn apply_update(doc: &mut bson::Document, update: &bson::Document) {
    if let Some(&Bson::Document(ref fields)) = update.get("$set") {
        for (key, value) in fields.iter() {
            doc.insert(key.to_owned(), value.clone());
        }
        return;
    }

    let id = doc.get("_id").cloned();
    *doc = update.clone();
    if let Some(id) = id {
        doc.insert("_id", id);
    }
}
