//! Database row types. These map directly to SQLite rows and stay distinct
//! from the warbler-types models so the password hash never escapes.

use chrono::{DateTime, Utc};
use rusqlite::Row;

use warbler_types::models::{Account, Message};

use crate::error::DbError;

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password, image_url, header_image_url, bio, location";

pub(crate) const MESSAGE_COLUMNS: &str = "id, text, created_at, user_id";

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            image_url: row.get(4)?,
            header_image_url: row.get(5)?,
            bio: row.get(6)?,
            location: row.get(7)?,
        })
    }
}

impl From<UserRow> for Account {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
        }
    }
}

pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub user_id: i64,
}

impl MessageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
            user_id: row.get(3)?,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = DbError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc);
        Ok(Self {
            id: row.id,
            text: row.text,
            created_at,
            user_id: row.user_id,
        })
    }
}

pub(crate) fn into_messages(rows: Vec<MessageRow>) -> crate::Result<Vec<Message>> {
    rows.into_iter().map(Message::try_from).collect()
}
