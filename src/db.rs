use std::path::Path;

use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use tracing::{debug, info};

use crate::error::{ExtractError, Result};
use crate::models::{ChannelType, RawRow};
use crate::schema::{channel_member_history as cmh, channels, file_info, posts, users};

/// Read-only access to a Mattermost database
pub struct Database {
    conn: Connection,
}

/// A message row before the channel type is decoded
struct SourceRow {
    sender: String,
    text: String,
    channel: String,
    channel_type: String,
    receiver: Option<String>,
    timestamp: i64,
    post_id: String,
    parent_post_id: Option<String>,
    file_extension: Option<String>,
}

impl Database {
    /// Open an existing database file read-only
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ExtractError::DataSource(format!(
                "Database file not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        info!(path = %path.display(), "Opened source database");
        Ok(Self { conn })
    }

    /// Wrap an already open connection
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Build the message/receiver query
    ///
    /// One row per (message, receiver) pair, where receivers are the channel
    /// members at the time the message was posted. Channels the excluded bot
    /// ever joined are skipped, as are empty and system posts.
    fn message_rows_query(exclude_bot: bool) -> String {
        let system_types = posts::SYSTEM_TYPES
            .iter()
            .map(|t| format!("'{t}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut query = format!(
            "SELECT U.{email} AS sender, P.{message} AS message, C.{name} AS channel_name, \
             C.{ctype} AS channel_type, \
             (SELECT R.{email} FROM {users} R WHERE R.{uid} = CMH.{member}) AS receiver, \
             P.{createat} AS createat, P.{pid} AS post_id, P.{parent} AS post_parent_id, \
             F.{extension} AS file_extension \
             FROM {posts} P \
             INNER JOIN {users} U ON P.{author} = U.{uid} \
             INNER JOIN {cmh} CMH ON P.{pchannel} = CMH.{hchannel} \
             INNER JOIN {channels} C ON P.{pchannel} = C.{cid} \
             LEFT JOIN {fileinfo} F ON P.{pid} = F.{fpost} \
             WHERE P.{message} != '' AND P.{createat} > CMH.{join} \
             AND (CMH.{leave} IS NULL OR CMH.{leave} > P.{createat}) \
             AND COALESCE(P.{ptype}, '') NOT IN ({system_types})",
            email = users::EMAIL,
            users = users::TABLE,
            uid = users::ID,
            message = posts::MESSAGE,
            name = channels::NAME,
            ctype = channels::TYPE,
            member = cmh::USER_ID,
            createat = posts::CREATE_AT,
            pid = posts::ID,
            parent = posts::PARENT_ID,
            extension = file_info::EXTENSION,
            posts = posts::TABLE,
            author = posts::USER_ID,
            cmh = cmh::TABLE,
            pchannel = posts::CHANNEL_ID,
            hchannel = cmh::CHANNEL_ID,
            channels = channels::TABLE,
            cid = channels::ID,
            fileinfo = file_info::TABLE,
            fpost = file_info::POST_ID,
            join = cmh::JOIN_TIME,
            leave = cmh::LEAVE_TIME,
            ptype = posts::TYPE,
        );

        if exclude_bot {
            query.push_str(&format!(
                " AND C.{cid} NOT IN (SELECT {hchannel} FROM {cmh} WHERE {member} = \
                 (SELECT {uid} FROM {users} WHERE {username} = ?1))",
                cid = channels::ID,
                hchannel = cmh::CHANNEL_ID,
                cmh = cmh::TABLE,
                member = cmh::USER_ID,
                uid = users::ID,
                users = users::TABLE,
                username = users::USERNAME,
            ));
        }

        // Receivers of one message follow join order
        query.push_str(&format!(
            " ORDER BY P.{createat} DESC, P.{message} ASC, CMH.{join} ASC",
            createat = posts::CREATE_AT,
            message = posts::MESSAGE,
            join = cmh::JOIN_TIME,
        ));
        query
    }

    /// Fetch one row per (message, receiver) pair, newest first
    pub fn message_rows(&self, excluded_bot: Option<&str>) -> Result<Vec<RawRow>> {
        let query = Self::message_rows_query(excluded_bot.is_some());
        debug!(query = %query, "Fetching message rows");

        let mut stmt = self.conn.prepare(&query)?;
        let row_iter = stmt.query_map(params_from_iter(excluded_bot), Self::map_source_row)?;

        let mut results = Vec::new();
        for row in row_iter {
            results.push(Self::decode(row?)?);
        }

        info!(rows = results.len(), "Fetched message rows");
        Ok(results)
    }

    /// Fetch every (username, email) pair
    pub fn user_emails(&self) -> Result<Vec<(String, String)>> {
        let query = format!(
            "SELECT {username}, {email} FROM {table}",
            username = users::USERNAME,
            email = users::EMAIL,
            table = users::TABLE
        );
        let mut stmt = self.conn.prepare(&query)?;
        let user_iter = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut results = Vec::new();
        for user in user_iter {
            results.push(user?);
        }
        Ok(results)
    }

    /// Map a database row to a SourceRow
    fn map_source_row(row: &Row) -> rusqlite::Result<SourceRow> {
        Ok(SourceRow {
            sender: row.get("sender")?,
            text: row.get("message")?,
            channel: row.get("channel_name")?,
            channel_type: row.get("channel_type")?,
            receiver: row.get("receiver")?,
            timestamp: row.get("createat")?,
            post_id: row.get("post_id")?,
            parent_post_id: row.get("post_parent_id")?,
            file_extension: row.get("file_extension")?,
        })
    }

    fn decode(row: SourceRow) -> Result<RawRow> {
        let channel_type = ChannelType::from_code(&row.channel_type).ok_or_else(|| {
            ExtractError::DataSource(format!(
                "Unknown channel type {:?} for post {}",
                row.channel_type, row.post_id
            ))
        })?;
        Ok(RawRow {
            sender: row.sender,
            text: row.text,
            channel: row.channel,
            channel_type,
            receiver: row.receiver,
            timestamp: row.timestamp,
            post_id: row.post_id,
            parent_post_id: row.parent_post_id.filter(|id| !id.is_empty()),
            file_extension: row.file_extension.filter(|ext| !ext.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let conn = Connection::open_in_memory().expect("in-memory database");
        conn.execute_batch(include_str!("../tests/fixtures/mattermost.sql"))
            .expect("schema");
        conn.execute_batch(
            "INSERT INTO users VALUES ('u1', 'alice', 'alice@x.org'), ('u2', 'bob', 'bob@x.org'),
                                      ('u3', 'carol', 'carol@x.org'), ('bot', 'surveybot', 'bot@x.org');
             INSERT INTO channels VALUES ('c1', 'town-square', 'O'), ('c2', 'survey', 'P');
             INSERT INTO channelmemberhistory VALUES ('c1', 'u1', 10, NULL), ('c1', 'u2', 20, NULL),
                                                     ('c1', 'u3', 30, 150),
                                                     ('c2', 'u1', 10, NULL), ('c2', 'bot', 10, NULL);
             INSERT INTO posts VALUES ('p1', 100, 'u1', 'c1', '', 'hello all', ''),
                                      ('p2', 200, 'u2', 'c1', 'p1', 'hi alice', ''),
                                      ('p3', 300, 'u1', 'c1', '', '', ''),
                                      ('p4', 400, 'u2', 'c1', '', 'bob joined', 'system_join_channel'),
                                      ('p5', 500, 'u1', 'c2', '', 'take the survey', '');
             INSERT INTO fileinfo VALUES ('f1', 'p2', 'png');",
        )
        .expect("seed data");
        Database::from_connection(conn)
    }

    #[test]
    fn test_rows_follow_membership_history() {
        let db = seeded();
        let rows = db.message_rows(Some("surveybot")).expect("rows");
        let pairs: Vec<_> = rows
            .iter()
            .map(|r| (r.post_id.as_str(), r.receiver.as_deref()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("p2", Some("alice@x.org")),
                ("p2", Some("bob@x.org")),
                ("p1", Some("alice@x.org")),
                ("p1", Some("bob@x.org")),
                ("p1", Some("carol@x.org")),
            ]
        );
    }

    #[test]
    fn test_row_fields_are_decoded() {
        let db = seeded();
        let rows = db.message_rows(Some("surveybot")).expect("rows");
        let reply = &rows[0];
        assert_eq!(reply.sender, "bob@x.org");
        assert_eq!(reply.channel, "town-square");
        assert_eq!(reply.channel_type, ChannelType::Public);
        assert_eq!(reply.parent_post_id.as_deref(), Some("p1"));
        assert_eq!(reply.file_extension.as_deref(), Some("png"));
        assert_eq!(rows[2].parent_post_id, None);
        assert_eq!(rows[2].file_extension, None);
    }

    #[test]
    fn test_bot_channels_are_kept_without_exclusion() {
        let db = seeded();
        let rows = db.message_rows(None).expect("rows");
        assert!(rows.iter().any(|r| r.post_id == "p5"));
    }

    #[test]
    fn test_unknown_channel_type_is_data_source_error() {
        let db = seeded();
        db.conn
            .execute("UPDATE channels SET type = 'Z' WHERE id = 'c1'", [])
            .expect("update");
        assert!(matches!(
            db.message_rows(Some("surveybot")),
            Err(ExtractError::DataSource(_))
        ));
    }

    #[test]
    fn test_user_emails() {
        let db = seeded();
        let mut users = db.user_emails().expect("users");
        users.sort();
        assert_eq!(users.len(), 4);
        assert_eq!(users[0], ("alice".to_string(), "alice@x.org".to_string()));
    }

    #[test]
    fn test_file_database_rejects_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mattermost.db");
        Connection::open(&path)
            .and_then(|conn| conn.execute_batch(include_str!("../tests/fixtures/mattermost.sql")))
            .expect("schema");

        let db = Database::open(&path).expect("open");
        let write = db
            .conn
            .execute("INSERT INTO users VALUES ('u9', 'mallory', 'm@x.org')", []);
        assert!(matches!(
            write,
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == rusqlite::ErrorCode::ReadOnly
        ));
        assert!(db.user_emails().expect("users").is_empty());
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        assert!(matches!(
            Database::open(Path::new("/nonexistent/mattermost.db")),
            Err(ExtractError::DataSource(_))
        ));
    }
}
