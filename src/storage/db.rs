use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    error::Result,
    i18n::Locale,
    storage::models::{User, UserRole},
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                telegram_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                language TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Devs are looked up on every system notification
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
            [],
        )?;

        Ok(())
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let role: String = row.get(2)?;
        let language: String = row.get(3)?;
        let created_at: String = row.get(4)?;

        Ok(User {
            telegram_id: row.get(0)?,
            name: row.get(1)?,
            role: UserRole::from_str(&role).unwrap_or(UserRole::User),
            language: Locale::from_str(&language).unwrap_or(Locale::En),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// Inserts the user, or refreshes name, role and language of an existing one.
    /// Returns `true` when the user was not known before.
    pub fn upsert_user(&self, user: &User) -> Result<bool> {
        let existed = self.get_user(user.telegram_id)?.is_some();

        self.conn.execute(
            "INSERT INTO users (telegram_id, name, role, language, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(telegram_id) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                language = excluded.language",
            params![
                user.telegram_id,
                user.name,
                user.role.to_string(),
                user.language.to_string(),
                user.created_at.to_rfc3339(),
            ],
        )?;

        Ok(!existed)
    }

    pub fn get_user(&self, telegram_id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT telegram_id, name, role, language, created_at
                 FROM users
                 WHERE telegram_id = ?1",
                [telegram_id],
                Self::row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    pub fn get_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT telegram_id, name, role, language, created_at
             FROM users
             WHERE role = ?1
             ORDER BY telegram_id",
        )?;

        let users = stmt
            .query_map([role.to_string()], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    pub fn count_users(&self) -> Result<usize> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_upsert_reports_new_users_only_once() {
        let (_dir, db) = open();
        let user = User::new(42, "Alice", UserRole::User, Locale::En);

        assert!(db.upsert_user(&user).unwrap());
        assert!(!db.upsert_user(&user).unwrap());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_get_user_round_trips_fields() {
        let (_dir, db) = open();
        let user = User::new(7, "Bob", UserRole::Admin, Locale::Ru);
        db.upsert_user(&user).unwrap();

        let loaded = db.get_user(7).unwrap().unwrap();
        assert_eq!(loaded.name, "Bob");
        assert_eq!(loaded.role, UserRole::Admin);
        assert_eq!(loaded.language, Locale::Ru);
        assert!(db.get_user(8).unwrap().is_none());
    }

    #[test]
    fn test_get_by_role() {
        let (_dir, db) = open();
        db.upsert_user(&User::new(3, "Dev B", UserRole::Dev, Locale::En)).unwrap();
        db.upsert_user(&User::new(1, "Dev A", UserRole::Dev, Locale::En)).unwrap();
        db.upsert_user(&User::new(2, "Plain", UserRole::User, Locale::En)).unwrap();

        let devs = db.get_by_role(UserRole::Dev).unwrap();
        let ids: Vec<_> = devs.iter().map(|u| u.telegram_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
