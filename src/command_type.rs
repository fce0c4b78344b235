//! Monitorable command types.

/// Executable operation types that can be monitored by the client.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CommandType {
    Command,
    DropCollection,
    Find,
    FindOne,
    Insert,
    InsertOne,
    Remove,
    RemoveOne,
    Update,
    UpdateOne,
}

impl CommandType {
    pub fn to_str(&self) -> &str {
        match *self {
            CommandType::Command => "command",
            CommandType::DropCollection => "drop_collection",
            CommandType::Find => "find",
            CommandType::FindOne => "find_one",
            CommandType::Insert => "insert",
            CommandType::InsertOne => "insert_one",
            CommandType::Remove => "remove",
            CommandType::RemoveOne => "remove_one",
            CommandType::Update => "update",
            CommandType::UpdateOne => "update_one",
        }
    }
}
