//! Flag vectors handed to the transport alongside each operation.
pub mod flags;
