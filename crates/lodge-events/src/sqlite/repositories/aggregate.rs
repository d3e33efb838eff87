//! Aggregate index: which aggregates exist, in creation order.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// Aggregate index repository.
pub struct AggregateRepo;

impl AggregateRepo {
    /// Register `id` at the next list position; returns that position.
    pub fn insert(conn: &Connection, id: &str, incarnation: &str, created_at: &str) -> Result<i64> {
        let list_index = Self::next_index(conn)?;
        let _ = conn.execute(
            "INSERT INTO aggregates (id, list_index, incarnation, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, list_index, incarnation, created_at],
        )?;
        Ok(list_index)
    }

    /// Incarnation `id` was registered with, if registered.
    pub fn incarnation(conn: &Connection, id: &str) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT incarnation FROM aggregates WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Whether `id` is registered.
    pub fn exists(conn: &Connection, id: &str) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM aggregates WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// List position of `id`, if registered.
    pub fn list_index(conn: &Connection, id: &str) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT list_index FROM aggregates WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Remove `id` from the index. Returns whether a row was removed.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM aggregates WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Every registered id, in creation order.
    pub fn list(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT id FROM aggregates ORDER BY list_index ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<String>, _>>()?)
    }

    /// Position the next registered aggregate will take.
    pub fn next_index(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row(
            "SELECT COALESCE(MAX(list_index) + 1, 0) FROM aggregates",
            [],
            |row| row.get(0),
        )?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_assigns_increasing_indexes() {
        let conn = setup();
        assert_eq!(AggregateRepo::insert(&conn, "a", "i0", "t0").unwrap(), 0);
        assert_eq!(AggregateRepo::insert(&conn, "b", "i1", "t1").unwrap(), 1);
        assert_eq!(AggregateRepo::list_index(&conn, "b").unwrap(), Some(1));
        assert_eq!(AggregateRepo::next_index(&conn).unwrap(), 2);
    }

    #[test]
    fn duplicate_id_rejected() {
        let conn = setup();
        AggregateRepo::insert(&conn, "a", "i0", "t0").unwrap();
        assert!(AggregateRepo::insert(&conn, "a", "i1", "t1").is_err());
    }

    #[test]
    fn list_follows_creation_order() {
        let conn = setup();
        for id in ["zeta", "alpha", "mid"] {
            AggregateRepo::insert(&conn, id, "i", "t").unwrap();
        }
        assert_eq!(AggregateRepo::list(&conn).unwrap(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn delete_removes_entry() {
        let conn = setup();
        AggregateRepo::insert(&conn, "a", "i", "t").unwrap();
        assert!(AggregateRepo::exists(&conn, "a").unwrap());
        assert!(AggregateRepo::delete(&conn, "a").unwrap());
        assert!(!AggregateRepo::exists(&conn, "a").unwrap());
        assert!(!AggregateRepo::delete(&conn, "a").unwrap());
        assert_eq!(AggregateRepo::list_index(&conn, "a").unwrap(), None);
    }

    #[test]
    fn reinsert_after_delete_carries_new_incarnation() {
        let conn = setup();
        AggregateRepo::insert(&conn, "a", "first", "t").unwrap();
        assert_eq!(AggregateRepo::incarnation(&conn, "a").unwrap().as_deref(), Some("first"));
        AggregateRepo::delete(&conn, "a").unwrap();
        assert_eq!(AggregateRepo::incarnation(&conn, "a").unwrap(), None);
        AggregateRepo::insert(&conn, "a", "second", "t").unwrap();
        assert_eq!(AggregateRepo::incarnation(&conn, "a").unwrap().as_deref(), Some("second"));
    }
}
