use std::sync::Arc;

use docstore::errors::DocStoreResult;
use docstore::{Collection, Document, Key};
use docstore_postgres::{PostgresClient, PostgresCollection};

use crate::server::InMemoryPostgres;

/// A fresh collection over its own in-memory server. Each test gets an
/// isolated table, so suites can run in parallel.
pub fn create_test_collection() -> DocStoreResult<PostgresCollection> {
    let client: Arc<dyn PostgresClient> = Arc::new(InMemoryPostgres::new());
    let table = format!("t_{}", uuid::Uuid::new_v4().simple());
    PostgresCollection::new(client, &table)
}

pub fn insert(
    collection: &dyn Collection,
    key: &str,
    json: serde_json::Value,
) -> DocStoreResult<()> {
    collection.upsert(&Key::new(key), &Document::from(json))?;
    Ok(())
}
