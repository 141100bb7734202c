use docstore::filter::field;
use docstore::{Collection, Document, Key};
use docstore_int_test::test_util::{create_test_collection, insert};
use indexmap::IndexMap;
use serde_json::json;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_upsert_reports_whether_document_existed() {
    let collection = create_test_collection().unwrap();
    let key = Key::new("k1");

    let updated = collection
        .upsert(&key, &Document::from(json!({"name": "alice"})))
        .unwrap();
    assert!(!updated, "first write inserts");

    let updated = collection
        .upsert(&key, &Document::from(json!({"name": "bob"})))
        .unwrap();
    assert!(updated, "second write replaces");
}

#[test]
fn test_upsert_and_return_gives_stored_document() {
    let collection = create_test_collection().unwrap();
    let document = Document::from(json!({"name": "alice", "age": 30}));

    let stored = collection
        .upsert_and_return(&Key::new("k1"), &document)
        .unwrap();
    assert_eq!(stored, document);
}

#[test]
fn test_create_does_not_overwrite_existing_document() {
    let collection = create_test_collection().unwrap();
    let key = Key::new("k1");
    let original = Document::from(json!({"version": 1}));

    let result = collection.create(&key, &original).unwrap();
    assert!(result.succeeded);
    assert_eq!(result.document, Some(original.clone()));

    let result = collection
        .create(&key, &Document::from(json!({"version": 2})))
        .unwrap();
    assert!(!result.succeeded);
    assert_eq!(result.document, None);

    // losing create left the stored document untouched
    let docs = collection
        .search(&docstore::Query::new())
        .unwrap()
        .collect_documents()
        .unwrap();
    assert_eq!(docs, vec![original]);
}

#[test]
fn test_conditional_update_applies_when_condition_holds() {
    let collection = create_test_collection().unwrap();
    let key = Key::new("k1");
    insert(&collection, "k1", json!({"version": "1", "name": "alice"})).unwrap();

    let replacement = Document::from(json!({"version": "2", "name": "alice"}));
    let condition = field("version").eq("1");
    let result = collection
        .update(&key, &replacement, Some(&condition))
        .unwrap();

    assert!(result.succeeded);
    assert_eq!(result.document, Some(replacement));
}

#[test]
fn test_conditional_update_rejected_when_condition_fails() {
    let collection = create_test_collection().unwrap();
    let key = Key::new("k1");
    let original = json!({"version": "1"});
    insert(&collection, "k1", original.clone()).unwrap();

    let condition = field("version").eq("7");
    let result = collection
        .update(&key, &Document::from(json!({"version": "8"})), Some(&condition))
        .unwrap();

    assert!(!result.succeeded);
    assert_eq!(result.document, None);

    let docs = collection
        .search(&docstore::Query::new())
        .unwrap()
        .collect_documents()
        .unwrap();
    assert_eq!(docs, vec![Document::from(original)]);
}

#[test]
fn test_update_of_missing_key_does_not_succeed() {
    let collection = create_test_collection().unwrap();
    let result = collection
        .update(&Key::new("ghost"), &Document::from(json!({"a": 1})), None)
        .unwrap();
    assert!(!result.succeeded);
}

#[test]
fn test_unconditional_update_replaces_existing_document() {
    let collection = create_test_collection().unwrap();
    insert(&collection, "k1", json!({"a": 1})).unwrap();

    let replacement = Document::from(json!({"a": 2}));
    let result = collection
        .update(&Key::new("k1"), &replacement, None)
        .unwrap();
    assert!(result.succeeded);
    assert_eq!(result.document, Some(replacement));
}

#[test]
fn test_update_sub_doc_patches_in_place() {
    let collection = create_test_collection().unwrap();
    insert(
        &collection,
        "k1",
        json!({"profile": {"city": "Oslo"}, "age": 30}),
    )
    .unwrap();

    let patched = collection
        .update_sub_doc(
            &Key::new("k1"),
            "profile.city",
            &Document::from(json!("Bergen")),
        )
        .unwrap();
    assert!(patched);

    let docs = collection
        .search(&docstore::Query::new())
        .unwrap()
        .collect_documents()
        .unwrap();
    assert_eq!(
        docs[0],
        Document::from(json!({"profile": {"city": "Bergen"}, "age": 30}))
    );
}

#[test]
fn test_update_sub_doc_on_missing_key() {
    let collection = create_test_collection().unwrap();
    let patched = collection
        .update_sub_doc(&Key::new("ghost"), "a.b", &Document::from(json!(1)))
        .unwrap();
    assert!(!patched);
}

#[test]
fn test_delete_sub_doc_removes_field() {
    let collection = create_test_collection().unwrap();
    insert(&collection, "k1", json!({"keep": 1, "drop": {"x": 2}})).unwrap();

    assert!(collection
        .delete_sub_doc(&Key::new("k1"), "drop")
        .unwrap());

    let docs = collection
        .search(&docstore::Query::new())
        .unwrap()
        .collect_documents()
        .unwrap();
    assert_eq!(docs[0], Document::from(json!({"keep": 1})));
}

#[test]
fn test_bulk_upsert() {
    let collection = create_test_collection().unwrap();
    let mut documents = IndexMap::new();
    documents.insert(Key::new("k1"), Document::from(json!({"n": "1"})));
    documents.insert(Key::new("k2"), Document::from(json!({"n": "2"})));
    documents.insert(Key::new("k3"), Document::from(json!({"n": "3"})));

    assert!(collection.bulk_upsert(&documents).unwrap());
    assert_eq!(collection.count().unwrap(), 3);
}

#[test]
fn test_bulk_upsert_returns_pre_images_of_existing_keys_only() {
    let collection = create_test_collection().unwrap();
    insert(&collection, "k1", json!({"n": "old-1"})).unwrap();
    insert(&collection, "k3", json!({"n": "old-3"})).unwrap();

    let mut documents = IndexMap::new();
    documents.insert(Key::new("k1"), Document::from(json!({"n": "new-1"})));
    documents.insert(Key::new("k2"), Document::from(json!({"n": "new-2"})));
    documents.insert(Key::new("k3"), Document::from(json!({"n": "new-3"})));

    let pre_images = collection
        .bulk_upsert_and_return_older_documents(&documents)
        .unwrap()
        .collect_documents()
        .unwrap();

    // only keys that held a document before contribute a pre-image
    assert_eq!(
        pre_images,
        vec![
            Document::from(json!({"n": "old-1"})),
            Document::from(json!({"n": "old-3"})),
        ]
    );

    // all three keys now resolve to their newly-upserted documents
    let docs = collection
        .search(&docstore::Query::new().order_by("n", docstore::SortOrder::Ascending))
        .unwrap()
        .collect_documents()
        .unwrap();
    assert_eq!(
        docs,
        vec![
            Document::from(json!({"n": "new-1"})),
            Document::from(json!({"n": "new-2"})),
            Document::from(json!({"n": "new-3"})),
        ]
    );
}

#[test]
fn test_delete_and_delete_all() {
    let collection = create_test_collection().unwrap();
    insert(&collection, "k1", json!({})).unwrap();
    insert(&collection, "k2", json!({})).unwrap();

    assert!(collection.delete(&Key::new("k1")).unwrap());
    assert!(!collection.delete(&Key::new("k1")).unwrap());
    assert_eq!(collection.count().unwrap(), 1);

    assert!(collection.delete_all().unwrap());
    assert_eq!(collection.count().unwrap(), 0);
}

#[test]
fn test_drop_collection_removes_backing_table() {
    let collection = create_test_collection().unwrap();
    insert(&collection, "k1", json!({})).unwrap();

    collection.drop_collection().unwrap();
    assert!(collection.count().is_err());
}
