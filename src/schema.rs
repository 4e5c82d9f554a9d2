//! Database schema definitions
//!
//! Table and column names of the Mattermost database read by the extractor.
//! Only the columns used by the extraction queries are listed.

/// Users table schema
pub mod users {
    /// Table name
    pub const TABLE: &str = "users";
    /// Primary key column
    pub const ID: &str = "id";
    /// Login name, the target of `@` mentions
    pub const USERNAME: &str = "username";
    /// Email address, the identity that gets anonymized
    pub const EMAIL: &str = "email";
}

/// Posts table schema
pub mod posts {
    /// Table name
    pub const TABLE: &str = "posts";
    /// Primary key column
    pub const ID: &str = "id";
    /// Author column
    pub const USER_ID: &str = "userid";
    /// Channel column
    pub const CHANNEL_ID: &str = "channelid";
    /// Message text column
    pub const MESSAGE: &str = "message";
    /// Creation time in milliseconds since the epoch
    pub const CREATE_AT: &str = "createat";
    /// Parent post for replies, empty otherwise
    pub const PARENT_ID: &str = "parentid";
    /// Post type, empty for regular messages
    pub const TYPE: &str = "type";

    /// System post types excluded from the extraction
    pub const SYSTEM_TYPES: &[&str] = &["system_join_channel", "system_add_to_channel", "system_join_team"];
}

/// Channels table schema
pub mod channels {
    /// Table name
    pub const TABLE: &str = "channels";
    /// Primary key column
    pub const ID: &str = "id";
    /// Channel name column
    pub const NAME: &str = "name";
    /// Channel type code (O, P, G or D)
    pub const TYPE: &str = "type";
}

/// Channel membership history schema
pub mod channel_member_history {
    /// Table name
    pub const TABLE: &str = "channelmemberhistory";
    /// Channel column
    pub const CHANNEL_ID: &str = "channelid";
    /// Member column
    pub const USER_ID: &str = "userid";
    /// Join time in milliseconds
    pub const JOIN_TIME: &str = "jointime";
    /// Leave time in milliseconds, null while still a member
    pub const LEAVE_TIME: &str = "leavetime";
}

/// File attachments schema
pub mod file_info {
    /// Table name
    pub const TABLE: &str = "fileinfo";
    /// Attached-to post column
    pub const POST_ID: &str = "postid";
    /// File extension column
    pub const EXTENSION: &str = "extension";
}
