use super::*;

const SAMPLE: &str = r#"[
  {"id": "p001", "name": "Argan Shampoo", "brand": "Acme", "category": "shampoo", "price": 450},
  {"id": "p002", "name": "Body Lotion", "image_url": "/images/products/p002.jpg"}
]"#;

#[test]
fn load_missing_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(tmp.path().join("products.json"));
    assert!(matches!(store.load(), Err(CatalogError::NotFound(_))));
}

#[test]
fn load_and_save_preserve_unknown_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("products.json");
    std::fs::write(&path, SAMPLE).unwrap();

    let store = CatalogStore::new(&path);
    let mut catalog = store.load().unwrap();
    assert_eq!(catalog.len(), 2);
    assert!(catalog.set_image_url("p001", "/images/products/p001.jpg"));
    store.save(&catalog).unwrap();

    let reloaded = store.load().unwrap();
    let p1 = reloaded.get("p001").unwrap();
    assert_eq!(p1.image_url.as_deref(), Some("/images/products/p001.jpg"));
    assert_eq!(p1.extra.get("price"), Some(&serde_json::json!(450)));
}

#[test]
fn save_is_pretty_printed_with_two_spaces() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("products.json");
    std::fs::write(&path, SAMPLE).unwrap();
    let store = CatalogStore::new(&path);
    let catalog = store.load().unwrap();
    store.save(&catalog).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[\n  {\n    \"id\": \"p001\""));
    assert!(text.ends_with("]\n"));
    assert!(!tmp.path().join("products.json.tmp").exists());
}

#[test]
fn duplicate_ids_are_rejected() {
    let json = r#"[{"id": "a"}, {"id": "a"}]"#;
    assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
}

#[test]
fn empty_id_is_rejected() {
    let json = r#"[{"id": " "}]"#;
    assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
}

#[test]
fn non_array_is_rejected() {
    assert!(matches!(
        Catalog::from_json(r#"{"products": []}"#),
        Err(CatalogError::Invalid(_))
    ));
}

#[test]
fn set_image_url_unknown_id() {
    let mut catalog = Catalog::from_json(SAMPLE).unwrap();
    assert!(!catalog.set_image_url("nope", "/x.jpg"));
    assert_eq!(catalog.position("p002"), Some(1));
}

#[test]
fn numeric_ids_keep_their_json_type_across_save() {
    let catalog = Catalog::from_json(r#"[{"id": 42, "name": "Soap"}, {"id": "p7"}]"#).unwrap();
    assert!(catalog.get("42").is_some());

    let v: serde_json::Value = serde_json::from_str(&catalog.to_json_pretty().unwrap()).unwrap();
    assert!(v[0]["id"].is_number());
    assert_eq!(v[0]["id"], 42);
    assert_eq!(v[1]["id"], "p7");
}
