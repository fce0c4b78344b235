use bson::{self, Bson};

use crate::error::Error::ResponseError;
use crate::Result;

use std::convert::TryFrom;

/// Results for an insert operation.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertResult {
    /// The `_id` of every document sent, including generated ones.
    pub inserted_ids: Vec<Bson>,
    /// The server's acknowledgment, if the insert was acknowledged.
    pub reply: Option<bson::Document>,
}

/// Results for an insert_one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Bson,
    pub reply: Option<bson::Document>,
}

/// Results for an update or remove operation.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteResult {
    pub reply: Option<bson::Document>,
}

impl InsertResult {
    pub fn new(inserted_ids: Vec<Bson>, reply: Option<bson::Document>) -> InsertResult {
        InsertResult { inserted_ids, reply }
    }

    pub fn acknowledged(&self) -> bool {
        self.reply.is_some()
    }
}

impl InsertOneResult {
    pub fn acknowledged(&self) -> bool {
        self.reply.is_some()
    }
}

impl WriteResult {
    pub fn new(reply: Option<bson::Document>) -> WriteResult {
        WriteResult { reply }
    }

    pub fn acknowledged(&self) -> bool {
        self.reply.is_some()
    }

    /// The number of documents affected, as reported by an acknowledgment.
    pub fn count(&self) -> Result<Option<i32>> {
        match self.reply.as_ref().and_then(|reply| reply.get("n")) {
            Some(&Bson::I32(n)) => Ok(Some(n)),
            Some(&Bson::I64(n)) => i32::try_from(n).map(Some).map_err(|_| {
                ResponseError(format!("Affected count out of range in reply: {}", n))
            }),
            _ => Ok(None),
        }
    }
}
