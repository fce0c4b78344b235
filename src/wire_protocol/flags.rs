//! Operation flags.
use crate::coll::options::{FindOptions, InsertOptions, RemoveOptions, UpdateOptions};

bitflags! {
    /// Represents the bit vector of options for an OP_UPDATE message.
    pub struct OpUpdateFlags: i32 {
        const UPSERT       = 0b00000001;
        const MULTI_UPDATE = 0b00000010;
    }
}

bitflags! {
    /// Represents the bit vector of flags for an OP_INSERT message.
    pub struct OpInsertFlags: i32 {
        const CONTINUE_ON_ERROR = 0b00000001;
    }
}

bitflags! {
    /// Represents the bit vector of flags for an OP_DELETE message.
    pub struct OpDeleteFlags: i32 {
        const SINGLE_REMOVE = 0b00000001;
    }
}

bitflags! {
    /// Represents the bit vector of flags for an OP_QUERY message.
    pub struct OpQueryFlags: i32 {
        const SLAVE_OK          = 0b00000100;
        const NO_CURSOR_TIMEOUT = 0b00010000;
    }
}

impl OpQueryFlags {
    /// Constructs the flags for a query from its options and its resolved routing.
    ///
    /// `slave_okay` is the routing captured when the cursor was created; the
    /// `slave_okay` field of `options` has already been folded into it.
    pub fn with_find_options(options: &FindOptions, slave_okay: bool) -> OpQueryFlags {
        let mut flags = OpQueryFlags::empty();

        if slave_okay {
            flags.insert(Self::SLAVE_OK);
        }

        if options.no_cursor_timeout {
            flags.insert(Self::NO_CURSOR_TIMEOUT);
        }

        flags
    }

    pub fn slave_ok(&self) -> bool {
        self.contains(Self::SLAVE_OK)
    }
}

impl OpInsertFlags {
    pub fn with_insert_options(options: &InsertOptions) -> OpInsertFlags {
        if options.continue_on_error {
            OpInsertFlags::CONTINUE_ON_ERROR
        } else {
            OpInsertFlags::empty()
        }
    }
}

impl OpUpdateFlags {
    pub fn with_update_options(options: &UpdateOptions) -> OpUpdateFlags {
        let mut flags = OpUpdateFlags::empty();

        if options.upsert {
            flags.insert(Self::UPSERT);
        }

        if options.multi {
            flags.insert(Self::MULTI_UPDATE);
        }

        flags
    }
}

impl OpDeleteFlags {
    pub fn with_remove_options(options: &RemoveOptions) -> OpDeleteFlags {
        if options.single {
            OpDeleteFlags::SINGLE_REMOVE
        } else {
            OpDeleteFlags::empty()
        }
    }
}
