//! Plain user records. The graph only uses the id as an ownership scope.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

pub fn create_user(conn: &Connection, name: &str, email: &str) -> Result<User> {
    let user = User {
        id: uuid::Uuid::now_v7().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    conn.execute(
        "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.name, user.email, user.created_at],
    )?;
    Ok(user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare("SELECT id, name, email, created_at FROM users ORDER BY created_at, id")?;
    let users = stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, created_at FROM users WHERE id = ?1",
            params![id],
            map_row,
        )
        .optional()?;
    Ok(user)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn create_list_get() {
        let conn = db::open_memory_database().unwrap();
        let ada = create_user(&conn, "Ada", "ada@example.com").unwrap();
        create_user(&conn, "Grace", "grace@example.com").unwrap();

        assert_eq!(list_users(&conn).unwrap().len(), 2);
        assert_eq!(get_user(&conn, &ada.id).unwrap(), Some(ada));
        assert!(get_user(&conn, "missing").unwrap().is_none());
    }
}
