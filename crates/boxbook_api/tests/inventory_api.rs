use boxbook_api::{ApiConfig, ApiResponse, InventoryApi};
use boxbook_core::{
    BookPatch, BookRecord, BookStatus, InventoryService, InventoryStore, MemoryInventoryRepository,
    NewBook, SqliteInventoryRepository,
};
use serde_json::{json, Value};

fn new_book(title: &str) -> NewBook {
    NewBook {
        title: title.to_string(),
        description: "paperback".to_string(),
        author: "Writer".to_string(),
        price: 8.5,
    }
}

fn id_of(response: &ApiResponse, key: &str) -> String {
    response.body[key]["id"]
        .as_str()
        .unwrap_or_else(|| panic!("missing {key}.id in {:?}", response.body))
        .to_string()
}

fn error_code(response: &ApiResponse) -> &str {
    response
        .body
        .get("error_code")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

#[test]
fn every_operation_reports_documented_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api.sqlite3");
    let config = ApiConfig::from_lookup(|key| {
        (key == "BOXBOOK_DB_PATH").then(|| path.to_string_lossy().into_owned())
    });
    let conn = config.open_connection().unwrap();
    let api = InventoryApi::new(InventoryService::new(
        SqliteInventoryRepository::try_new(&conn).unwrap(),
    ));

    let created = api.create_box("Shelf1");
    assert_eq!(created.status, 201);
    let box_id = id_of(&created, "box");
    assert_eq!(api.create_box(" ").status, 400);

    assert_eq!(api.list_boxes().status, 200);
    assert_eq!(api.get_box(&box_id).status, 200);
    assert_eq!(api.update_box(&box_id, "Shelf One").status, 200);
    assert_eq!(api.get_box(&box_id).body["box"]["name"], json!("Shelf One"));

    let stored = api.create_book_in_box(&box_id, new_book("K1"));
    assert_eq!(stored.status, 201);
    assert_eq!(stored.body["book"]["status"], json!("stored"));
    let k1 = id_of(&stored, "book");

    let loose = api.create_book(new_book("K2"));
    assert_eq!(loose.status, 201);
    assert_eq!(loose.body["book"]["status"], json!("unstored"));
    let k2 = id_of(&loose, "book");

    let located = api.locate_book(&k1);
    assert_eq!(located.status, 200);
    assert_eq!(located.body["box_id"], Value::String(box_id.clone()));

    let not_stored = api.locate_book(&k2);
    assert_eq!(not_stored.status, 404);
    assert_eq!(error_code(&not_stored), "not_stored");

    let duplicate = api.add_book_to_box(&box_id, &k1);
    assert_eq!(duplicate.status, 400);
    assert_eq!(error_code(&duplicate), "already_linked");

    assert_eq!(api.delete_box(&box_id).status, 400);
    let still_stored = api.delete_book(&k1);
    assert_eq!(still_stored.status, 400);
    assert_eq!(error_code(&still_stored), "book_still_stored");

    let patch = BookPatch {
        price: Some(10.0),
        ..BookPatch::default()
    };
    assert_eq!(api.update_book(&k2, &patch).status, 200);
    assert_eq!(api.get_book(&k2).body["book"]["price"], json!(10.0));

    assert_eq!(api.add_book_to_box(&box_id, &k2).status, 200);
    assert_eq!(api.remove_book_from_box(&box_id, &k1).status, 200);
    let unlinked = api.remove_book_from_box(&box_id, &k1);
    assert_eq!(unlinked.status, 400);
    assert_eq!(error_code(&unlinked), "not_linked");

    assert_eq!(api.delete_book(&k1).status, 200);
    assert_eq!(api.get_book(&k1).status, 404);
    assert_eq!(api.list_books().body["books"].as_array().unwrap().len(), 1);

    assert_eq!(api.remove_book_from_box(&box_id, &k2).status, 200);
    assert_eq!(api.delete_box(&box_id).status, 200);
    assert_eq!(api.delete_box(&box_id).status, 404);
}

#[test]
fn full_box_rejects_sixth_book_with_bad_request() {
    let conn = boxbook_core::db::open_db_in_memory().unwrap();
    let api = InventoryApi::new(InventoryService::new(
        SqliteInventoryRepository::try_new(&conn).unwrap(),
    ));
    let box_id = id_of(&api.create_box("Shelf1"), "box");
    for index in 0..5 {
        let response = api.create_book_in_box(&box_id, new_book(&format!("B{index}")));
        assert_eq!(response.status, 201);
    }

    let overflow = api.create_book_in_box(&box_id, new_book("B5"));
    assert_eq!(overflow.status, 400);
    assert_eq!(error_code(&overflow), "box_full");

    let k2 = id_of(&api.create_book(new_book("K2")), "book");
    let rejected = api.add_book_to_box(&box_id, &k2);
    assert_eq!(rejected.status, 400);
    assert_eq!(error_code(&rejected), "box_full");
    assert_eq!(
        api.get_box(&box_id).body["box"]["contents"]
            .as_array()
            .unwrap()
            .len(),
        5
    );

    let missing_box =
        api.create_book_in_box("00000000-0000-0000-0000-000000000000", new_book("X"));
    assert_eq!(missing_box.status, 404);
    assert_eq!(error_code(&missing_box), "box_not_found");
}

#[test]
fn stored_book_missing_from_every_box_is_server_error() {
    let repo = MemoryInventoryRepository::new();
    let mut orphan = BookRecord::new(new_book("Orphan"), 1);
    orphan.status = BookStatus::Stored;
    repo.put_book(&orphan).unwrap();

    let api = InventoryApi::new(InventoryService::new(repo));
    let response = api.locate_book(&orphan.id.to_string());
    assert_eq!(response.status, 500);
    assert_eq!(error_code(&response), "inconsistent_state");
    assert_eq!(response.to_json()["status"], json!(500));
}
