//! # SQLite Thread Store
//!
//! Persistent conversation memory using the shared [`StylistDb`] connection.
//! The connection mutex serializes every append, which covers the
//! per-thread ordering guarantee.

use crate::error::StoreError;
use crate::state::thread::pair_aligned;
use crate::state::{ConversationThread, Role, StylistDb, Turn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

use super::thread_store::ThreadStore;

pub struct SqliteThreadStore {
    conn: Arc<Mutex<Connection>>,
    max_turns: usize,
}

impl SqliteThreadStore {
    pub fn new(db: &StylistDb, max_turns: usize) -> Self {
        Self {
            conn: db.connection(),
            max_turns: pair_aligned(max_turns),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn load(&self, thread_id: &str) -> Result<ConversationThread, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT role, content, created_at
            FROM conversation_turns
            WHERE thread_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![thread_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut thread = ConversationThread::new(thread_id);
        for (role, content, created_at) in rows {
            let role: Role = role.parse().map_err(StoreError::Corrupt)?;
            let timestamp = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", created_at, e)))?
                .with_timezone(&Utc);
            thread.turns.push(Turn {
                role,
                content,
                timestamp,
            });
        }
        Ok(thread)
    }

    fn insert(&self, thread_id: &str, turns: &[Turn]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for turn in turns {
            tx.execute(
                "INSERT INTO conversation_turns (thread_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    thread_id,
                    turn.role.as_str(),
                    turn.content,
                    turn.timestamp.to_rfc3339()
                ],
            )?;
        }

        if self.max_turns > 0 {
            tx.execute(
                r#"
                DELETE FROM conversation_turns
                WHERE thread_id = ?1 AND id NOT IN (
                    SELECT id FROM conversation_turns
                    WHERE thread_id = ?1
                    ORDER BY id DESC
                    LIMIT ?2
                )
                "#,
                params![thread_id, self.max_turns as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn exists(&self, thread_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM conversation_turns WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn get_or_create(&self, thread_id: &str) -> Result<ConversationThread, StoreError> {
        self.load(thread_id)
    }

    async fn history(&self, thread_id: &str) -> Result<Option<ConversationThread>, StoreError> {
        if self.exists(thread_id)? {
            self.load(thread_id).map(Some)
        } else {
            Ok(None)
        }
    }

    async fn append(&self, thread_id: &str, turns: Vec<Turn>) -> Result<(), StoreError> {
        self.insert(thread_id, &turns)
    }

    async fn clear(&self, thread_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM conversation_turns WHERE thread_id = ?1",
            params![thread_id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_thread_round_trip() {
        let db = StylistDb::open_in_memory().unwrap();
        let store = SqliteThreadStore::new(&db, 20);

        assert!(store.history("t1").await.unwrap().is_none());
        assert!(store.get_or_create("t1").await.unwrap().is_empty());

        store
            .append("t1", vec![Turn::user("Rain in Leuven?"), Turn::assistant("Bring a coat.")])
            .await
            .unwrap();
        store
            .append("t2", vec![Turn::user("Other thread")])
            .await
            .unwrap();

        let thread = store.history("t1").await.unwrap().unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread.turns[0].role, Role::User);
        assert_eq!(thread.turns[1].content, "Bring a coat.");
    }

    #[tokio::test]
    async fn test_sqlite_eviction() {
        let db = StylistDb::open_in_memory().unwrap();
        let store = SqliteThreadStore::new(&db, 2);
        for i in 0..3 {
            store
                .append(
                    "t1",
                    vec![Turn::user(format!("q{}", i)), Turn::assistant(format!("a{}", i))],
                )
                .await
                .unwrap();
        }
        let thread = store.history("t1").await.unwrap().unwrap();
        let contents: Vec<_> = thread.turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q2", "a2"]);
    }

    #[tokio::test]
    async fn test_sqlite_odd_cap_keeps_whole_pairs() {
        let db = StylistDb::open_in_memory().unwrap();
        let store = SqliteThreadStore::new(&db, 3);
        for i in 0..3 {
            store
                .append(
                    "t1",
                    vec![Turn::user(format!("q{}", i)), Turn::assistant(format!("a{}", i))],
                )
                .await
                .unwrap();
        }
        let thread = store.history("t1").await.unwrap().unwrap();
        let contents: Vec<_> = thread.turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2", "a2"]);
    }

    #[tokio::test]
    async fn test_sqlite_clear() {
        let db = StylistDb::open_in_memory().unwrap();
        let store = SqliteThreadStore::new(&db, 20);
        store.append("t1", vec![Turn::user("hi")]).await.unwrap();
        assert!(store.clear("t1").await.unwrap());
        assert!(store.history("t1").await.unwrap().is_none());
    }
}
