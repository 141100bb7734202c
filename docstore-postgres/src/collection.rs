use docstore::errors::{DocStoreError, DocStoreResult, ErrorKind};
use docstore::filter::Filter;
use docstore::{Collection, CreateResult, Document, DocumentStream, Key, Query, UpdateResult};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::client::PostgresClient;
use crate::compiler::compile_filter;
use crate::field::path_array_literal;
use crate::params::Params;
use crate::query::{build_search_sql, build_total_sql};
use crate::sql;

/// A document collection backed by a Postgres table with a JSONB blob column.
///
/// Each operation compiles to a single parameterized statement; per-statement
/// atomicity from the engine is what backs the mutation-protocol guarantees
/// (at most one concurrent `create` per key succeeds, `update` is an atomic
/// check-and-set, bulk pre-images are captured atomically with each key's
/// write).
///
/// Construction bootstraps the backing table if it does not exist.
#[derive(Clone)]
pub struct PostgresCollection {
    client: Arc<dyn PostgresClient>,
    collection_name: String,
}

impl PostgresCollection {
    /// Opens (creating if absent) the collection's backing table.
    ///
    /// # Arguments
    ///
    /// * `client` - The query-execution boundary of the storage engine
    /// * `collection_name` - Name of the collection; used as the table name
    pub fn new(client: Arc<dyn PostgresClient>, collection_name: &str) -> DocStoreResult<Self> {
        client.execute_update(&sql::create_table_sql(collection_name), &Params::new())?;
        log::debug!("Opened postgres collection {}", collection_name);
        Ok(PostgresCollection {
            client,
            collection_name: collection_name.to_string(),
        })
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.collection_name
    }

    fn single_row_missing(&self, operation: &str) -> DocStoreError {
        log::error!(
            "{} on collection {} returned no row",
            operation,
            self.collection_name
        );
        DocStoreError::new(
            &format!(
                "{} on collection {} returned no row",
                operation, self.collection_name
            ),
            ErrorKind::BackendError,
        )
    }
}

impl Collection for PostgresCollection {
    fn upsert(&self, key: &Key, document: &Document) -> DocStoreResult<bool> {
        let mut params = Params::new();
        params.push_text(key.as_str());
        params.push_json(document.as_value().clone());

        let mut rows = self
            .client
            .execute_query(&sql::upsert_sql(&self.collection_name), &params)?;
        let row = rows.next().ok_or_else(|| self.single_row_missing("upsert"))??;
        row.get_bool(0)
    }

    fn upsert_and_return(&self, key: &Key, document: &Document) -> DocStoreResult<Document> {
        let mut params = Params::new();
        params.push_text(key.as_str());
        params.push_json(document.as_value().clone());

        let mut rows = self
            .client
            .execute_query(&sql::upsert_and_return_sql(&self.collection_name), &params)?;
        let row = rows
            .next()
            .ok_or_else(|| self.single_row_missing("upsert_and_return"))??;
        Ok(Document::from(row.get_json(0)?))
    }

    fn create(&self, key: &Key, document: &Document) -> DocStoreResult<CreateResult> {
        let mut params = Params::new();
        params.push_text(key.as_str());
        params.push_json(document.as_value().clone());

        let mut rows = self
            .client
            .execute_query(&sql::create_sql(&self.collection_name), &params)?;
        match rows.next() {
            Some(row) => Ok(CreateResult::created(Document::from(row?.get_json(0)?))),
            // the key was already occupied; not an error
            None => Ok(CreateResult::already_exists()),
        }
    }

    fn update(
        &self,
        key: &Key,
        document: &Document,
        condition: Option<&Filter>,
    ) -> DocStoreResult<UpdateResult> {
        let mut params = Params::new();
        params.push_json(document.as_value().clone());
        params.push_text(key.as_str());
        // the condition compiles after the SET/key placeholders so its params
        // line up with the trailing predicate
        let predicate = match condition {
            Some(filter) => compile_filter(filter, &mut params)?,
            None => None,
        };

        let mut rows = self.client.execute_query(
            &sql::update_sql(&self.collection_name, predicate.as_deref()),
            &params,
        )?;
        match rows.next() {
            Some(row) => Ok(UpdateResult::updated(Document::from(row?.get_json(0)?))),
            // condition did not hold (or no document under the key); not an error
            None => Ok(UpdateResult::condition_failed()),
        }
    }

    fn update_sub_doc(
        &self,
        key: &Key,
        sub_doc_path: &str,
        sub_document: &Document,
    ) -> DocStoreResult<bool> {
        let mut params = Params::new();
        params.push_text(path_array_literal(sub_doc_path));
        params.push_json(sub_document.as_value().clone());
        params.push_text(key.as_str());

        let affected = self
            .client
            .execute_update(&sql::set_sub_doc_sql(&self.collection_name), &params)?;
        Ok(affected > 0)
    }

    fn delete_sub_doc(&self, key: &Key, sub_doc_path: &str) -> DocStoreResult<bool> {
        let mut params = Params::new();
        params.push_text(path_array_literal(sub_doc_path));
        params.push_text(key.as_str());

        let affected = self
            .client
            .execute_update(&sql::unset_sub_doc_sql(&self.collection_name), &params)?;
        Ok(affected > 0)
    }

    fn search(&self, query: &Query) -> DocStoreResult<DocumentStream> {
        let mut params = Params::new();
        let search_sql = build_search_sql(&self.collection_name, query, &mut params)?;
        log::debug!("Searching collection {}: {}", self.collection_name, search_sql);

        let rows = self.client.execute_query(&search_sql, &params)?;
        Ok(DocumentStream::new(Box::new(rows.map(|row| {
            row.and_then(|row| Ok(Document::from(row.get_json(0)?)))
        }))))
    }

    fn delete(&self, key: &Key) -> DocStoreResult<bool> {
        let mut params = Params::new();
        params.push_text(key.as_str());
        let affected = self
            .client
            .execute_update(&sql::delete_sql(&self.collection_name), &params)?;
        Ok(affected > 0)
    }

    fn delete_all(&self) -> DocStoreResult<bool> {
        self.client
            .execute_update(&sql::delete_all_sql(&self.collection_name), &Params::new())?;
        Ok(true)
    }

    fn count(&self) -> DocStoreResult<u64> {
        let mut rows = self
            .client
            .execute_query(&sql::count_sql(&self.collection_name), &Params::new())?;
        let row = rows.next().ok_or_else(|| self.single_row_missing("count"))??;
        Ok(row.get_i64(0)? as u64)
    }

    fn total(&self, query: &Query) -> DocStoreResult<u64> {
        let mut params = Params::new();
        let total_sql = build_total_sql(&self.collection_name, query, &mut params)?;
        let mut rows = self.client.execute_query(&total_sql, &params)?;
        let row = rows.next().ok_or_else(|| self.single_row_missing("total"))??;
        Ok(row.get_i64(0)? as u64)
    }

    fn bulk_upsert(&self, documents: &IndexMap<Key, Document>) -> DocStoreResult<bool> {
        log::debug!(
            "Bulk upserting {} documents into collection {}",
            documents.len(),
            self.collection_name
        );
        for (key, document) in documents {
            self.upsert(key, document)?;
        }
        Ok(true)
    }

    fn bulk_upsert_and_return_older_documents(
        &self,
        documents: &IndexMap<Key, Document>,
    ) -> DocStoreResult<DocumentStream> {
        let pre_image_sql = sql::upsert_returning_pre_image_sql(&self.collection_name);
        let mut pre_images = Vec::new();
        for (key, document) in documents {
            let mut params = Params::new();
            params.push_text(key.as_str());
            params.push_text(key.as_str());
            params.push_json(document.as_value().clone());

            let mut rows = self.client.execute_query(&pre_image_sql, &params)?;
            // a key with no prior document contributes nothing
            if let Some(row) = rows.next() {
                pre_images.push(Ok(Document::from(row?.get_json(0)?)));
            }
        }
        Ok(DocumentStream::new(Box::new(pre_images.into_iter())))
    }

    fn drop_collection(&self) -> DocStoreResult<()> {
        log::debug!("Dropping collection {}", self.collection_name);
        self.client
            .execute_update(&sql::drop_table_sql(&self.collection_name), &Params::new())?;
        Ok(())
    }
}
