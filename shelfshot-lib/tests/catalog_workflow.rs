use shelfshot_lib::backup::{BackupTarget, backup_catalog};
use shelfshot_lib::dedup::duplicate_groups;
use shelfshot_lib::placeholder::ensure_placeholder;
use shelfshot_lib::{CatalogStore, DedupIndex};

const CATALOG: &str = r#"[
  {"id": "a1", "name": "Olive Soap", "image_url": "/images/products/shared.jpg", "price": 3},
  {"id": "a2", "name": "Lemon Soap", "image_url": "/images/products/copy.jpg?v=9"},
  {"id": "a3", "name": "Rose Soap", "image_url": "/images/products/rose.jpg"},
  {"id": "a4", "name": "Mint Soap", "image_url": "https://cdn.example/mint.jpg"},
  {"id": "a5", "name": "Tar Soap"}
]"#;

#[test]
fn backup_then_resolve_duplicates_and_placeholders() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("shared.jpg"), b"same bytes").unwrap();
    std::fs::write(images.join("copy.jpg"), b"same bytes").unwrap();
    std::fs::write(images.join("rose.jpg"), b"rose bytes").unwrap();

    let path = tmp.path().join("products.json");
    std::fs::write(&path, CATALOG).unwrap();
    let store = CatalogStore::new(&path);

    let backup = backup_catalog(&path, &BackupTarget::Suffix("dedup.bak".into())).unwrap();
    assert_eq!(std::fs::read(&backup).unwrap(), CATALOG.as_bytes());

    let mut catalog = store.load().unwrap();
    let index = DedupIndex::scan_dir(&images).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.digest_count(), 2);

    let groups = duplicate_groups(catalog.entries(), &index, "/images/products");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].keeper(), "a1");
    assert_eq!(groups[0].others(), ["a2".to_string()]);

    // Resolve the duplicate and the missing image with placeholders
    for id in ["a2", "a5"] {
        let entry = catalog.get(id).unwrap().clone();
        let first = ensure_placeholder(&images, &entry).unwrap();
        let again = ensure_placeholder(&images, &entry).unwrap();
        assert!(first.created);
        assert!(!again.created);
        assert_eq!(std::fs::read(&first.path).unwrap(), std::fs::read(&again.path).unwrap());
        assert!(catalog.set_image_url(id, format!("/images/products/{}", first.filename)));
    }
    store.save(&catalog).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, catalog);
    assert_eq!(reloaded.get("a1").unwrap().extra["price"], 3);
    assert!(reloaded.entries().iter().all(|e| e.current_image().is_some()));

    let rescanned = DedupIndex::scan_dir(&images).unwrap();
    assert!(duplicate_groups(reloaded.entries(), &rescanned, "/images/products").is_empty());
}
