use rusqlite::{Connection, OptionalExtension, params};

use warbler_types::models::{Account, Message, ProfileCounts};

use crate::accounts::query_accounts;
use crate::error::Result;
use crate::models::{MESSAGE_COLUMNS, MessageRow, USER_COLUMNS, into_messages};

/// Follow edges between accounts and like edges from accounts to messages.
pub trait SocialGraph {
    /// Add the edge `follower -> followee`. Returns `false` if it already existed.
    fn follow(&self, follower: i64, followee: i64) -> Result<bool>;

    fn unfollow(&self, follower: i64, followee: i64) -> Result<bool>;

    /// Does `account` follow `other`?
    fn is_following(&self, account: i64, other: i64) -> Result<bool>;

    /// Is `account` followed by `other`?
    fn is_followed_by(&self, account: i64, other: i64) -> Result<bool>;

    /// Accounts `account` follows.
    fn following(&self, account: i64) -> Result<Vec<Account>>;

    /// Accounts following `account`.
    fn followers(&self, account: i64) -> Result<Vec<Account>>;

    fn like(&self, account: i64, message: i64) -> Result<bool>;

    fn unlike(&self, account: i64, message: i64) -> Result<bool>;

    /// Like when not liked yet, unlike otherwise. Returns whether the
    /// message is liked afterwards.
    fn toggle_like(&self, account: i64, message: i64) -> Result<bool>;

    fn liked_messages(&self, account: i64) -> Result<Vec<Message>>;

    fn liked_message_ids(&self, account: i64) -> Result<Vec<i64>>;

    fn profile_counts(&self, account: i64) -> Result<ProfileCounts>;
}

impl SocialGraph for Connection {
    fn follow(&self, follower: i64, followee: i64) -> Result<bool> {
        let inserted = self.execute(
            "INSERT INTO follows (follower_id, followee_id) VALUES (?1, ?2)
             ON CONFLICT DO NOTHING",
            params![follower, followee],
        )?;
        Ok(inserted > 0)
    }

    fn unfollow(&self, follower: i64, followee: i64) -> Result<bool> {
        let removed = self.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower, followee],
        )?;
        Ok(removed > 0)
    }

    fn is_following(&self, account: i64, other: i64) -> Result<bool> {
        edge_exists(self, account, other)
    }

    fn is_followed_by(&self, account: i64, other: i64) -> Result<bool> {
        edge_exists(self, other, account)
    }

    fn following(&self, account: i64) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE id IN (SELECT followee_id FROM follows WHERE follower_id = ?1)
             ORDER BY id"
        );
        query_accounts(self, &sql, [account])
    }

    fn followers(&self, account: i64) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE id IN (SELECT follower_id FROM follows WHERE followee_id = ?1)
             ORDER BY id"
        );
        query_accounts(self, &sql, [account])
    }

    fn like(&self, account: i64, message: i64) -> Result<bool> {
        let inserted = self.execute(
            "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)
             ON CONFLICT DO NOTHING",
            params![account, message],
        )?;
        Ok(inserted > 0)
    }

    fn unlike(&self, account: i64, message: i64) -> Result<bool> {
        let removed = self.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
            params![account, message],
        )?;
        Ok(removed > 0)
    }

    fn toggle_like(&self, account: i64, message: i64) -> Result<bool> {
        let existing: Option<i64> = self
            .query_row(
                "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![account, message],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                self.execute("DELETE FROM likes WHERE id = ?1", [id])?;
                Ok(false)
            }
            None => self.like(account, message),
        }
    }

    fn liked_messages(&self, account: i64) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE id IN (SELECT message_id FROM likes WHERE user_id = ?1)
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map([account], MessageRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        into_messages(rows)
    }

    fn liked_message_ids(&self, account: i64) -> Result<Vec<i64>> {
        let mut stmt =
            self.prepare("SELECT message_id FROM likes WHERE user_id = ?1 ORDER BY message_id")?;
        let ids = stmt
            .query_map([account], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    fn profile_counts(&self, account: i64) -> Result<ProfileCounts> {
        let counts = self.query_row(
            "SELECT
                (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE followee_id = ?1),
                (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
            [account],
            |row| {
                Ok(ProfileCounts {
                    messages: row.get::<_, i64>(0)? as u64,
                    following: row.get::<_, i64>(1)? as u64,
                    followers: row.get::<_, i64>(2)? as u64,
                    likes: row.get::<_, i64>(3)? as u64,
                })
            },
        )?;

        Ok(counts)
    }
}

fn edge_exists(conn: &Connection, follower: i64, followee: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower, followee],
            |row| row.get(0),
        )
        .optional()?;

    Ok(found.is_some())
}
