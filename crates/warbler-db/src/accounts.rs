use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use warbler_types::models::{
    Account, DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, NewAccount, ProfileUpdate,
};

use crate::error::{DbError, Result};
use crate::models::{USER_COLUMNS, UserRow};

/// Account persistence and password verification.
pub trait CredentialStore {
    /// Create an account, hashing `password` before it is stored.
    fn signup(&self, new: &NewAccount) -> Result<Account>;

    /// `Some(account)` when the password verifies, `None` for an unknown
    /// username or a wrong password.
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>>;

    fn account(&self, id: i64) -> Result<Option<Account>>;

    fn account_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Accounts whose username contains `query`; every account when `None`.
    fn search_accounts(&self, query: Option<&str>) -> Result<Vec<Account>>;

    fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<Account>;

    /// Removes the account together with its messages, follows and likes.
    fn delete_account(&self, id: i64) -> Result<()>;

    fn account_count(&self) -> Result<u64>;
}

impl CredentialStore for Connection {
    fn signup(&self, new: &NewAccount) -> Result<Account> {
        // Blank fields are stored as NULL so the NOT NULL constraints reject them
        let username = non_empty(new.username.as_deref());
        let email = non_empty(new.email.as_deref());
        let password_hash = new
            .password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(hash_password)
            .transpose()?;
        let image_url = non_empty(new.image_url.as_deref()).unwrap_or(DEFAULT_IMAGE_URL);

        self.execute(
            "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
            params![username, email, password_hash, image_url],
        )?;

        let id = self.last_insert_rowid();
        debug!("Created account {}", id);
        self.account(id)?.ok_or(DbError::NotFound)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let Some(row) = query_user_row_by_username(self, username)? else {
            return Ok(None);
        };

        if verify_password(password, &row.password)? {
            Ok(Some(row.into()))
        } else {
            Ok(None)
        }
    }

    fn account(&self, id: i64) -> Result<Option<Account>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = self.query_row(&sql, [id], UserRow::from_row).optional()?;
        Ok(row.map(Account::from))
    }

    fn account_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(query_user_row_by_username(self, username)?.map(Account::from))
    }

    fn search_accounts(&self, query: Option<&str>) -> Result<Vec<Account>> {
        match non_empty(query) {
            Some(q) => {
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE username LIKE '%' || ?1 || '%' ORDER BY id"
                );
                query_accounts(self, &sql, [q])
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
                query_accounts(self, &sql, [])
            }
        }
    }

    fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<Account> {
        let image_url = non_empty(update.image_url.as_deref()).unwrap_or(DEFAULT_IMAGE_URL);
        let header_image_url =
            non_empty(update.header_image_url.as_deref()).unwrap_or(DEFAULT_HEADER_IMAGE_URL);

        let changed = self.execute(
            "UPDATE users
             SET username = ?1, email = ?2, image_url = ?3, header_image_url = ?4,
                 bio = ?5, location = ?6
             WHERE id = ?7",
            params![
                non_empty(Some(update.username.as_str())),
                non_empty(Some(update.email.as_str())),
                image_url,
                header_image_url,
                update.bio,
                update.location,
                id
            ],
        )?;

        if changed == 0 {
            return Err(DbError::NotFound);
        }
        self.account(id)?.ok_or(DbError::NotFound)
    }

    fn delete_account(&self, id: i64) -> Result<()> {
        let changed = self.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DbError::NotFound);
        }
        debug!("Deleted account {}", id);
        Ok(())
    }

    fn account_count(&self) -> Result<u64> {
        let count: i64 = self.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        Ok(count as u64)
    }
}

/// Hash with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Hash(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub(crate) fn query_accounts<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, UserRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(Account::from).collect())
}

fn query_user_row_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let row = conn
        .query_row(&sql, [username], UserRow::from_row)
        .optional()?;

    Ok(row)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn signup(db: &Database, username: &str, email: &str, password: &str) -> Account {
        db.transaction(|conn| conn.signup(&NewAccount::new(username, email, password)))
            .unwrap()
    }

    #[test]
    fn signup_stores_a_hash_not_the_password() {
        let db = Database::open_in_memory().unwrap();
        let account = signup(&db, "testuser", "test@test.com", "HASHED_PASSWORD");

        assert_eq!(account.username, "testuser");
        assert_eq!(account.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(account.header_image_url, DEFAULT_HEADER_IMAGE_URL);

        let stored: String = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT password FROM users WHERE id = ?1", [account.id], |r| {
                    r.get(0)
                })?)
            })
            .unwrap();
        assert_ne!(stored, "HASHED_PASSWORD");
        assert!(stored.starts_with("$argon2"));
    }

    #[test]
    fn signup_keeps_custom_image_url() {
        let db = Database::open_in_memory().unwrap();
        let mut new = NewAccount::new("testuser", "test@test.com", "password");
        new.image_url = Some("https://google.com".into());

        let account = db.transaction(|conn| conn.signup(&new)).unwrap();
        assert_eq!(account.image_url, "https://google.com");
        assert_eq!(db.with_conn(|conn| conn.account_count()).unwrap(), 1);
    }

    #[test]
    fn duplicate_username_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        signup(&db, "testuser", "test@test.com", "HASHED_PASSWORD");

        let err = db
            .transaction(|conn| conn.signup(&NewAccount::new("testuser", "test2@test.com", "HASHED_PWD2")))
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation(_)));
        assert!(err.to_string().contains("UniqueViolation"));
        assert_eq!(db.with_conn(|conn| conn.account_count()).unwrap(), 1);
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        signup(&db, "testuser", "test@test.com", "password");

        let err = db
            .transaction(|conn| conn.signup(&NewAccount::new("other", "test@test.com", "password")))
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[test]
    fn missing_fields_are_not_null_violations() {
        let db = Database::open_in_memory().unwrap();

        let cases = [
            NewAccount { email: None, ..NewAccount::new("testuser", "", "asdkfah") },
            NewAccount { password: None, ..NewAccount::new("testuser", "test@test.com", "") },
            NewAccount { username: None, ..NewAccount::new("", "test@test.com", "asdkfah") },
        ];

        for new in &cases {
            let err = db.transaction(|conn| conn.signup(new)).unwrap_err();
            assert!(err.to_string().contains("NotNullViolation"), "{err}");
        }
        assert_eq!(db.with_conn(|conn| conn.account_count()).unwrap(), 0);
    }

    #[test]
    fn authenticate_checks_username_and_password() {
        let db = Database::open_in_memory().unwrap();
        let account = signup(&db, "testuser", "test2@test.com", "HASHED_PWD2");

        db.with_conn(|conn| {
            assert_eq!(conn.authenticate("testuser", "HASHED_PWD2")?, Some(account.clone()));
            assert_eq!(conn.authenticate("invalid_username", "HASHED_PWD2")?, None);
            assert_eq!(conn.authenticate("testuser", "wrong_pwd")?, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn search_matches_username_substrings() {
        let db = Database::open_in_memory().unwrap();
        signup(&db, "alice", "alice@test.com", "password");
        signup(&db, "bob", "bob@test.com", "password");
        signup(&db, "alicia", "alicia@test.com", "password");

        let names = |q: Option<&str>| -> Vec<String> {
            db.with_conn(|conn| conn.search_accounts(q))
                .unwrap()
                .into_iter()
                .map(|a| a.username)
                .collect()
        };

        assert_eq!(names(Some("ali")), vec!["alice", "alicia"]);
        assert_eq!(names(None), vec!["alice", "bob", "alicia"]);
        assert_eq!(names(Some("  ")), vec!["alice", "bob", "alicia"]);
        assert!(names(Some("zed")).is_empty());
    }

    #[test]
    fn update_profile_resets_empty_images() {
        let db = Database::open_in_memory().unwrap();
        let account = signup(&db, "testuser", "test@test.com", "password");

        let update = ProfileUpdate {
            username: "renamed".into(),
            email: "new@test.com".into(),
            image_url: Some("".into()),
            header_image_url: Some("https://example.com/header.png".into()),
            bio: Some("hello".into()),
            location: Some("Oakland".into()),
        };
        let updated = db
            .transaction(|conn| conn.update_profile(account.id, &update))
            .unwrap();

        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(updated.header_image_url, "https://example.com/header.png");
        assert_eq!(updated.bio.as_deref(), Some("hello"));

        // the password is untouched by a profile edit
        let again = db.with_conn(|conn| conn.authenticate("renamed", "password")).unwrap();
        assert_eq!(again, Some(updated));
    }

    #[test]
    fn blank_fields_are_not_null_violations() {
        let db = Database::open_in_memory().unwrap();

        let cases = [
            NewAccount::new("", "", "sadkfjasd"),
            NewAccount::new("   ", "test@test.com", "sadkfjasd"),
            NewAccount::new("testuser", "test@test.com", ""),
        ];

        for new in &cases {
            let err = db.transaction(|conn| conn.signup(new)).unwrap_err();
            assert!(matches!(err, DbError::NotNullViolation(_)), "{err}");
        }
        assert_eq!(db.with_conn(|conn| conn.account_count()).unwrap(), 0);
    }

    #[test]
    fn update_profile_rejects_blank_username_and_email() {
        let db = Database::open_in_memory().unwrap();
        let account = signup(&db, "testuser", "test@test.com", "password");

        for (username, email) in [("", "test@test.com"), ("testuser", "  ")] {
            let update = ProfileUpdate {
                username: username.into(),
                email: email.into(),
                ..Default::default()
            };
            let err = db
                .transaction(|conn| conn.update_profile(account.id, &update))
                .unwrap_err();
            assert!(matches!(err, DbError::NotNullViolation(_)), "{err}");
        }

        let unchanged = db.with_conn(|conn| conn.account(account.id)).unwrap();
        assert_eq!(unchanged, Some(account));
    }

    #[test]
    fn update_profile_rejects_taken_username() {
        let db = Database::open_in_memory().unwrap();
        signup(&db, "first", "first@test.com", "password");
        let second = signup(&db, "second", "second@test.com", "password");

        let update = ProfileUpdate {
            username: "first".into(),
            email: "second@test.com".into(),
            ..Default::default()
        };
        let err = db
            .transaction(|conn| conn.update_profile(second.id, &update))
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[test]
    fn delete_missing_account_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.transaction(|conn| conn.delete_account(42)).unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
