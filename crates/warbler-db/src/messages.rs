use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use warbler_types::models::{MAX_MESSAGE_LEN, Message};

use crate::error::{DbError, Result};
use crate::models::{MESSAGE_COLUMNS, MessageRow, into_messages};

/// Short text posts, each owned by one account.
pub trait MessageLedger {
    fn create_message(&self, text: &str, author: i64) -> Result<Message>;

    fn message(&self, id: i64) -> Result<Option<Message>>;

    /// Delete `id` on behalf of `requester`, who must own it.
    fn delete_message(&self, id: i64, requester: i64) -> Result<()>;

    /// Most recent first.
    fn messages_by_author(&self, author: i64) -> Result<Vec<Message>>;

    /// Messages by `viewer` and the accounts `viewer` follows, most recent first.
    fn timeline(&self, viewer: i64, limit: u32) -> Result<Vec<Message>>;

    fn message_count(&self) -> Result<u64>;
}

impl MessageLedger for Connection {
    fn create_message(&self, text: &str, author: i64) -> Result<Message> {
        if text.trim().is_empty() {
            return Err(DbError::Validation("message text is empty".into()));
        }
        let len = text.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(DbError::Validation(format!(
                "message is {len} characters, limit is {MAX_MESSAGE_LEN}"
            )));
        }

        // Microsecond precision so RFC 3339 strings sort chronologically
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.execute(
            "INSERT INTO messages (text, created_at, user_id) VALUES (?1, ?2, ?3)",
            params![text, created_at, author],
        )?;

        let id = self.last_insert_rowid();
        debug!("Account {} posted message {}", author, id);
        self.message(id)?.ok_or(DbError::NotFound)
    }

    fn message(&self, id: i64) -> Result<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
        let row = self.query_row(&sql, [id], MessageRow::from_row).optional()?;
        row.map(Message::try_from).transpose()
    }

    fn delete_message(&self, id: i64, requester: i64) -> Result<()> {
        let owner: i64 = self
            .query_row("SELECT user_id FROM messages WHERE id = ?1", [id], |row| row.get(0))
            .optional()?
            .ok_or(DbError::NotFound)?;

        if owner != requester {
            return Err(DbError::AuthorizationFailed);
        }

        self.execute("DELETE FROM messages WHERE id = ?1", [id])?;
        Ok(())
    }

    fn messages_by_author(&self, author: i64) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        );
        query_messages(self, &sql, params![author])
    }

    fn timeline(&self, viewer: i64, limit: u32) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE user_id = ?1
                OR user_id IN (SELECT followee_id FROM follows WHERE follower_id = ?1)
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        );
        query_messages(self, &sql, params![viewer, limit])
    }

    fn message_count(&self) -> Result<u64> {
        let count: i64 = self.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?;
        Ok(count as u64)
    }
}

fn query_messages<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, MessageRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    into_messages(rows)
}
