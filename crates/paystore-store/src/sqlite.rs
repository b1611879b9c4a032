//! SQLite implementation of the RecordStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Documents live in a
//! single `records` table as JSON text; filters compile to `json_extract`
//! equality predicates.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

use crate::document::{Document, FieldValue, Fields, Filter, Mutation};
use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{RecordStore, Transaction};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Transactions are opened with
/// `BEGIN IMMEDIATE`, so other processes sharing the file wait for the
/// write lock instead of racing a read-then-write.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite record store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` on the connection from a blocking task.
    async fn blocking<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Connection) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<T, E> {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| E::from(StoreError::Task(format!("spawn_blocking failed: {}", e))))?
    }
}

/// [`Transaction`] over a borrowed connection.
///
/// Used both for one-shot operations and inside an open SQLite transaction.
struct ConnTxn<'c> {
    conn: &'c Connection,
}

/// Build `kind = ?1 AND json_extract(body, '$.field') = ?N ...`.
///
/// Field names are validated before being inlined; values are always bound.
fn where_clause(kind: &str, filter: &Filter) -> Result<(String, Vec<SqlValue>)> {
    filter.validate()?;

    let mut sql = String::from("kind = ?1");
    let mut values = vec![SqlValue::Text(kind.to_string())];

    for (name, value) in filter.clauses() {
        values.push(match value {
            FieldValue::Text(s) => SqlValue::Text(s.clone()),
            FieldValue::Integer(n) => SqlValue::Integer(*n),
        });
        sql.push_str(&format!(
            " AND json_extract(body, '$.{}') = ?{}",
            name,
            values.len()
        ));
    }

    Ok((sql, values))
}

fn parse_body(kind: &str, body: &str) -> Result<Document> {
    let fields: Fields = serde_json::from_str(body)?;
    Ok(Document::new(kind, fields))
}

impl Transaction for ConnTxn<'_> {
    fn find(&mut self, kind: &str, filter: &Filter) -> Result<Vec<Document>> {
        let (predicate, values) = where_clause(kind, filter)?;
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT body FROM records WHERE {} ORDER BY seq",
            predicate
        ))?;

        let bodies = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        bodies.iter().map(|body| parse_body(kind, body)).collect()
    }

    fn find_one(&mut self, kind: &str, filter: &Filter) -> Result<Option<Document>> {
        let (predicate, values) = where_clause(kind, filter)?;
        let body: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT body FROM records WHERE {} ORDER BY seq LIMIT 1",
                    predicate
                ),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| parse_body(kind, &body)).transpose()
    }

    fn insert(&mut self, document: &Document) -> Result<()> {
        let body = serde_json::to_string(&document.fields)?;
        self.conn.execute(
            "INSERT INTO records (kind, body, created_at) VALUES (?1, ?2, ?3)",
            params![document.kind, body, migration::now_millis()],
        )?;
        Ok(())
    }

    fn update(&mut self, kind: &str, filter: &Filter, mutation: &Mutation) -> Result<usize> {
        mutation.validate()?;
        let (predicate, mut values) = where_clause(kind, filter)?;

        if mutation.is_empty() {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM records WHERE {}", predicate),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;
            return Ok(count as usize);
        }

        let mut assignments = Vec::with_capacity(mutation.fields().len());
        for (name, value) in mutation.fields() {
            values.push(SqlValue::Text(serde_json::to_string(value)?));
            assignments.push(format!("'$.{}', json(?{})", name, values.len()));
        }

        let changed = self.conn.execute(
            &format!(
                "UPDATE records SET body = json_set(body, {}) WHERE {}",
                assignments.join(", "),
                predicate
            ),
            params_from_iter(values.iter()),
        )?;
        Ok(changed)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn find(&self, kind: &str, filter: &Filter) -> Result<Vec<Document>> {
        let kind = kind.to_string();
        let filter = filter.clone();
        self.blocking(move |conn| ConnTxn { conn }.find(&kind, &filter))
            .await
    }

    async fn find_one(&self, kind: &str, filter: &Filter) -> Result<Option<Document>> {
        let kind = kind.to_string();
        let filter = filter.clone();
        self.blocking(move |conn| ConnTxn { conn }.find_one(&kind, &filter))
            .await
    }

    async fn insert(&self, document: &Document) -> Result<()> {
        let document = document.clone();
        self.blocking(move |conn| ConnTxn { conn }.insert(&document))
            .await
    }

    async fn update(&self, kind: &str, filter: &Filter, mutation: &Mutation) -> Result<usize> {
        let kind = kind.to_string();
        let filter = filter.clone();
        let mutation = mutation.clone();
        self.blocking(move |conn| ConnTxn { conn }.update(&kind, &filter, &mutation))
            .await
    }

    async fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.blocking(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StoreError::from)?;

            // Dropping `tx` on the error path rolls back.
            let out = f(&mut ConnTxn { conn: &tx })?;

            tx.commit().map_err(StoreError::from)?;
            Ok(out)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(kind: &str, value: serde_json::Value) -> Document {
        Document::new(kind, value.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .insert(&doc("payment", json!({"channelId": "c1", "value": "30", "v": 27})))
            .await
            .unwrap();
        store
            .insert(&doc("payment", json!({"channelId": "c2", "value": "10", "v": 28})))
            .await
            .unwrap();
        store
            .insert(&doc("payment", json!({"channelId": "c1", "value": "20", "v": 27})))
            .await
            .unwrap();

        let found = store
            .find("payment", &Filter::new().eq("channelId", "c1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].get("value"), Some(&json!("30")));
        assert_eq!(found[1].get("value"), Some(&json!("20")));

        let by_v = store
            .find("payment", &Filter::new().eq("v", 28i64))
            .await
            .unwrap();
        assert_eq!(by_v.len(), 1);
        assert_eq!(by_v[0].get("channelId"), Some(&json!("c2")));
    }

    #[tokio::test]
    async fn test_find_one_returns_first_inserted() {
        let store = SqliteStore::open_memory().unwrap();
        for value in ["1", "2", "3"] {
            store
                .insert(&doc("token", json!({"token": "t", "value": value})))
                .await
                .unwrap();
        }

        let first = store
            .find_one("token", &Filter::new().eq("token", "t"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.get("value"), Some(&json!("1")));

        let none = store
            .find_one("token", &Filter::new().eq("token", "other"))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_kinds_are_disjoint() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .insert(&doc("a:channel", json!({"channelId": "c1"})))
            .await
            .unwrap();

        let filter = Filter::new().eq("channelId", "c1");
        assert!(store.find("b:channel", &filter).await.unwrap().is_empty());
        assert_eq!(store.find("a:channel", &filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .insert(&doc(
                "channel",
                json!({"channelId": "c1", "sender": "0xA", "value": "100", "spent": "0"}),
            ))
            .await
            .unwrap();

        let matched = store
            .update(
                "channel",
                &Filter::new().eq("channelId", "c1"),
                &Mutation::new().set("spent", "30"),
            )
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let stored = store
            .find_one("channel", &Filter::new().eq("channelId", "c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get("sender"), Some(&json!("0xA")));
        assert_eq!(stored.get("value"), Some(&json!("100")));
        assert_eq!(stored.get("spent"), Some(&json!("30")));

        let missed = store
            .update(
                "channel",
                &Filter::new().eq("channelId", "nope"),
                &Mutation::new().set("spent", "30"),
            )
            .await
            .unwrap();
        assert_eq!(missed, 0);
    }

    #[tokio::test]
    async fn test_failed_transaction_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();

        let result: std::result::Result<(), StoreError> = store
            .transaction(|tx| {
                tx.insert(&doc("token", json!({"token": "t"})))?;
                assert!(tx.find_one("token", &Filter::new())?.is_some());
                Err(StoreError::Io(std::io::Error::other("disk full")))
            })
            .await;
        assert!(result.is_err());

        let tokens = store.find("token", &Filter::new()).await.unwrap();
        assert!(tokens.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transactions_serialize_read_modify_write() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        store
            .insert(&doc("counter", json!({"name": "hits", "n": 0})))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transaction(|tx| -> Result<()> {
                        let filter = Filter::new().eq("name", "hits");
                        let current = tx
                            .find_one("counter", &filter)?
                            .and_then(|d| d.get("n").and_then(|n| n.as_i64()))
                            .unwrap_or(0);
                        tx.update("counter", &filter, &Mutation::new().set("n", current + 1))?;
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let counter = store
            .find_one("counter", &Filter::new().eq("name", "hits"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.get("n"), Some(&json!(16)));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paystore.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .insert(&doc("ns:token", json!({"token": "t1", "channelId": "c1"})))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let found = store
            .find_one("ns:token", &Filter::new().eq("token", "t1"))
            .await
            .unwrap();
        assert!(found.is_some());
    }
    /// Apply the same inserts and one update to `store`, then read back
    /// every channel's documents in order.
    async fn replay<S: RecordStore>(
        store: &S,
        docs: &[(u8, u32)],
        target: u8,
        spent: u32,
    ) -> (usize, Vec<Vec<Document>>) {
        for (channel, value) in docs {
            store
                .insert(&doc(
                    "payment",
                    json!({"channelId": format!("c{}", channel), "value": value}),
                ))
                .await
                .unwrap();
        }

        let matched = store
            .update(
                "payment",
                &Filter::new().eq("channelId", format!("c{}", target)),
                &Mutation::new().set("spent", spent),
            )
            .await
            .unwrap();

        let mut per_channel = Vec::new();
        for channel in 0..3u8 {
            let filter = Filter::new().eq("channelId", format!("c{}", channel));
            per_channel.push(store.find("payment", &filter).await.unwrap());
        }
        (matched, per_channel)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn sqlite_and_memory_agree(
            docs in prop::collection::vec((0u8..3, any::<u32>()), 0..20),
            target in 0u8..3,
            spent in any::<u32>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let (sqlite, memory) = runtime.block_on(async {
                let sqlite = SqliteStore::open_memory().unwrap();
                let memory = crate::memory::MemoryStore::new();
                (
                    replay(&sqlite, &docs, target, spent).await,
                    replay(&memory, &docs, target, spent).await,
                )
            });

            prop_assert_eq!(&sqlite, &memory);

            // Updates only add `spent`; `value` and insertion order survive.
            let (matched, per_channel) = sqlite;
            let expected: Vec<u32> = docs
                .iter()
                .filter(|(channel, _)| *channel == target)
                .map(|(_, value)| *value)
                .collect();
            prop_assert_eq!(matched, expected.len());
            let stored: Vec<u32> = per_channel[target as usize]
                .iter()
                .map(|d| d.get("value").and_then(|v| v.as_u64()).unwrap() as u32)
                .collect();
            prop_assert_eq!(stored, expected);
            for d in &per_channel[target as usize] {
                prop_assert_eq!(d.get("spent"), Some(&json!(spent)));
            }
        }
    }
}
