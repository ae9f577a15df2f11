use super::DbError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

pub fn insert_user(conn: &Connection, new: &NewUser) -> Result<User, DbError> {
    conn.execute(
        "INSERT INTO users (username, email) VALUES (?1, ?2)",
        params![new.username, new.email],
    )
    .map_err(|e| DbError::from_insert(e, &format!("user {}", new.username)))?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: new.username.to_owned(),
        email: new.email.to_owned(),
    })
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DbError> {
    let user = conn
        .query_row(
            "SELECT id, username, email FROM users WHERE id = ?1",
            [id],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let user = insert_user(conn, &new_user("hal", "hal@example.com"))?;
            assert_eq!(get_user(conn, user.id)?, Some(user));
            assert_eq!(get_user(conn, 999)?, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_username_or_email_conflicts() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert_user(conn, &new_user("hal", "hal@example.com"))?;
            let dup_name = insert_user(conn, &new_user("hal", "other@example.com"));
            assert!(matches!(dup_name, Err(DbError::Conflict(_))));
            let dup_mail = insert_user(conn, &new_user("other", "hal@example.com"));
            assert!(matches!(dup_mail, Err(DbError::Conflict(_))));
            Ok(())
        })
        .unwrap();
    }
}
