//! Options for collection-level operations.
use crate::resolver::WriteOptions;

/// Options for find queries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    /// The maximum number of documents to return; 0 means no limit.
    pub limit: i32,
    pub no_cursor_timeout: bool,
    /// Overrides the collection's routing flag for this cursor only.
    pub slave_okay: Option<bool>,
}

impl FindOptions {
    pub fn new() -> FindOptions {
        Default::default()
    }

    /// Options that allow (or forbid) the cursor to read from secondaries.
    pub fn with_slave_okay(slave_okay: bool) -> FindOptions {
        FindOptions { slave_okay: Some(slave_okay), ..Default::default() }
    }
}

/// Options for inserts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InsertOptions {
    /// Keep inserting the remaining documents after one fails.
    pub continue_on_error: bool,
    pub write: WriteOptions,
}

impl InsertOptions {
    pub fn new() -> InsertOptions {
        Default::default()
    }
}

impl From<WriteOptions> for InsertOptions {
    fn from(write: WriteOptions) -> InsertOptions {
        InsertOptions { write, ..Default::default() }
    }
}

/// Options for updates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateOptions {
    pub upsert: bool,
    pub multi: bool,
    pub write: WriteOptions,
}

impl UpdateOptions {
    pub fn new() -> UpdateOptions {
        Default::default()
    }
}

impl From<WriteOptions> for UpdateOptions {
    fn from(write: WriteOptions) -> UpdateOptions {
        UpdateOptions { write, ..Default::default() }
    }
}

/// Options for removals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoveOptions {
    /// Remove at most one matching document.
    pub single: bool,
    pub write: WriteOptions,
}

impl RemoveOptions {
    pub fn new() -> RemoveOptions {
        Default::default()
    }
}

impl From<WriteOptions> for RemoveOptions {
    fn from(write: WriteOptions) -> RemoveOptions {
        RemoveOptions { write, ..Default::default() }
    }
}
