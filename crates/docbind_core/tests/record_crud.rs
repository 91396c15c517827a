mod common;

use common::{item_adapter, raw_connection, Item, RefusingDriver};
use docbind_core::{AdapterError, AdapterOptions, Model, ModelAdapter};
use serde_json::json;
use std::rc::Rc;

#[test]
fn get_without_id_never_touches_the_store() {
    // Any store round trip would fail: the driver refuses connections.
    let adapter: ModelAdapter<Item> =
        ModelAdapter::new(Rc::new(RefusingDriver), AdapterOptions::default());

    assert!(adapter.get(None, None).unwrap().is_none());
    assert!(adapter.get(None, Some("")).unwrap().is_none());
}

#[test]
fn get_of_absent_document_is_none() {
    let (adapter, _driver) = item_adapter();
    assert!(adapter.get(None, Some("nope")).unwrap().is_none());
}

#[test]
fn post_adopts_the_generated_key() {
    let (adapter, driver) = item_adapter();

    let mut item = Item::new(None, Some("1"), None);
    adapter.post(None, &mut item).unwrap();

    let id = item.id.clone().expect("post should assign an id");
    let stored = raw_connection(&driver)
        .get("items", &id)
        .unwrap()
        .expect("document should be stored");
    assert_eq!(stored["key"], json!("1"));
    // Unset fields were stripped before the write.
    assert!(!stored.contains_key("user"));
    assert!(!stored.contains_key("tags"));
}

#[test]
fn post_keeps_a_caller_provided_id() {
    let (adapter, _driver) = item_adapter();

    let mut item = Item::new(Some(1), Some("A"), None);
    item.id = Some("fixed".to_string());
    adapter.post(None, &mut item).unwrap();

    assert_eq!(item.id.as_deref(), Some("fixed"));
    let loaded = adapter.get(None, Some("fixed")).unwrap().unwrap();
    assert_eq!(loaded.key.as_deref(), Some("A"));
}

#[test]
fn put_replaces_wholesale() {
    let (adapter, driver) = item_adapter();

    let mut item = Item::new(Some(1), Some("A"), Some(vec!["a", "b"]));
    adapter.post(None, &mut item).unwrap();
    let id = item.id.clone().unwrap();

    // The replacement drops `user` and `tags` entirely.
    let mut replacement = Item::new(None, Some("2"), None);
    replacement.id = Some(id.clone());
    adapter.put(None, &replacement).unwrap();

    let stored = raw_connection(&driver)
        .get("items", &id)
        .unwrap()
        .unwrap();
    assert_eq!(stored["key"], json!("2"));
    assert!(!stored.contains_key("user"));
    assert!(!stored.contains_key("tags"));
}

#[test]
fn put_without_id_is_a_typed_error() {
    let (adapter, _driver) = item_adapter();
    let err = adapter.put(None, &Item::new(None, Some("x"), None)).unwrap_err();
    assert!(matches!(err, AdapterError::MissingId { operation: "put", .. }));
}

#[test]
fn delete_then_get_is_none() {
    let (adapter, _driver) = item_adapter();

    let mut item = Item::new(Some(1), Some("A"), None);
    adapter.post(None, &mut item).unwrap();
    let id = item.id.clone().unwrap();

    adapter.delete(None, &item).unwrap();
    assert!(adapter.get(None, Some(&id)).unwrap().is_none());

    // Deleting an already-absent document is not an error.
    adapter.delete(None, &item).unwrap();
}

#[test]
fn writes_include_private_fields() {
    let (adapter, driver) = item_adapter();

    let mut item = Item::new(Some(1), Some("A"), None);
    item.token = Some("s3cret".to_string());
    adapter.post(None, &mut item).unwrap();

    // The adapter serializes with private fields; the model's public
    // rendition would omit them.
    assert!(!item.to_document(false).contains_key("token"));
    let stored = raw_connection(&driver)
        .get("items", item.id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored["token"], json!("s3cret"));
}
