mod common;

use common::{MockGateway, crm, is_argument, unreachable_crm};
use hubspot_crm::{Batch, BatchAction, Record, RecordId, ResourceType};
use serde_json::{Value, json};

fn new_contact(email: &str) -> Record {
    Record::from_value(ResourceType::Contact, json!({"email": email})).unwrap()
}

fn stored(resource: ResourceType, id: i64, properties: Value) -> Record {
    Record::from_value(resource, json!({"id": id.to_string(), "properties": properties})).unwrap()
}

fn inputs(gateway: &MockGateway, index: usize) -> Vec<Value> {
    gateway.body(index)["inputs"].as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_contacts_are_sent_ten_at_a_time() {
    let gateway = MockGateway::new();
    gateway.push(201, json!({"status": "COMPLETE", "results": []}));
    gateway.push(201, json!({"status": "COMPLETE", "results": []}));
    let crm = crm(&gateway);

    let records = (0..15).map(|i| new_contact(&format!("c{}@example.com", i))).collect();
    let mut batch = Batch::new(records).unwrap();

    assert!(batch.create(&crm).await.unwrap());
    assert_eq!(batch.action(), Some(BatchAction::Create));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/crm/v3/objects/contacts/batch/create");
    assert_eq!(inputs(&gateway, 0).len(), 10);
    assert_eq!(inputs(&gateway, 1).len(), 5);
    assert_eq!(batch.responses().len(), 2);
}

#[tokio::test]
async fn test_companies_are_sent_a_hundred_at_a_time() {
    let gateway = MockGateway::new();
    gateway.push(200, json!({"results": []}));
    gateway.push(200, json!({"results": []}));
    let crm = crm(&gateway);

    let records = (1..=150)
        .map(|id| {
            let mut company = stored(ResourceType::Company, id, json!({"name": "Old"}));
            company.set("name", format!("New {}", id));
            company
        })
        .collect();
    let mut batch = Batch::new(records).unwrap();

    assert!(batch.update(&crm).await.unwrap());
    assert_eq!(inputs(&gateway, 0).len(), 100);
    assert_eq!(inputs(&gateway, 1).len(), 50);
    assert_eq!(
        inputs(&gateway, 0)[0],
        json!({"id": "1", "properties": {"name": "New 1"}})
    );
}

#[tokio::test]
async fn test_create_reconciles_ids_by_properties() {
    let gateway = MockGateway::new();
    gateway.push(
        201,
        json!({
            "status": "COMPLETE",
            "results": [
                {"id": "2", "properties": {"email": "b@example.com", "hs_object_id": "2"}, "updatedAt": "2024-05-01T12:00:00Z"},
                {"id": "1", "properties": {"email": "a@example.com", "hs_object_id": "1"}, "updatedAt": "2024-05-01T12:00:00Z"}
            ]
        }),
    );
    let crm = crm(&gateway);

    let mut batch = Batch::new(vec![new_contact("a@example.com"), new_contact("b@example.com")]).unwrap();
    assert!(batch.create(&crm).await.unwrap());
    assert!(batch.all_successful());

    let records = batch.resources();
    assert_eq!(records[0].id(), Some(&RecordId::Int(1)));
    assert_eq!(records[1].id(), Some(&RecordId::Int(2)));
    assert!(!batch.any_changes());
    assert_eq!(records[0].properties()["email"], json!("a@example.com"));
    assert_eq!(records[0].metadata()["updatedAt"], json!("2024-05-01T12:00:00Z"));
}

#[tokio::test]
async fn test_update_skips_unchanged_records() {
    let gateway = MockGateway::new();
    gateway.push(200, json!({"results": [{"id": "2", "properties": {"name": "Beta Inc"}}]}));
    let crm = crm(&gateway);

    let unchanged = stored(ResourceType::Company, 1, json!({"name": "Alpha"}));
    let mut changed = stored(ResourceType::Company, 2, json!({"name": "Beta"}));
    changed.set("name", "Beta Inc");

    let mut batch = Batch::new(vec![unchanged, changed]).unwrap();
    assert!(batch.update(&crm).await.unwrap());

    assert_eq!(inputs(&gateway, 0), vec![json!({"id": "2", "properties": {"name": "Beta Inc"}})]);
    assert_eq!(batch.resources()[1].properties()["name"], json!("Beta Inc"));
    assert!(!batch.resources()[1].has_changes());
}

#[tokio::test]
async fn test_nothing_to_send_skips_the_api() {
    let crm = unreachable_crm();

    let records = vec![stored(ResourceType::Company, 1, json!({"name": "Alpha"}))];
    let mut batch = Batch::new(records).unwrap();
    assert!(!batch.update(&crm).await.unwrap());
    assert!(batch.responses().is_empty());

    let mut empty = Batch::new(vec![]).unwrap();
    assert!(is_argument(&empty.create(&crm).await.unwrap_err()));
}

#[tokio::test]
async fn test_mixed_types_are_rejected() {
    let contact = new_contact("a@example.com");
    let company = Record::from_value(ResourceType::Company, json!({"name": "Acme"})).unwrap();

    let err = Batch::new(vec![contact, company]).unwrap_err();
    assert!(is_argument(&err));
}

#[tokio::test]
async fn test_upsert_preconditions() {
    let crm = unreachable_crm();

    let mut keyed_by_id = Batch::new(vec![new_contact("a@example.com")]).unwrap();
    assert!(is_argument(&keyed_by_id.upsert(&crm).await.unwrap_err()));

    let no_email = Record::from_value(ResourceType::Contact, json!({"firstname": "Ann"})).unwrap();
    let mut missing = Batch::new(vec![new_contact("a@example.com"), no_email])
        .unwrap()
        .with_id_property("email");
    assert!(is_argument(&missing.upsert(&crm).await.unwrap_err()));
}

#[tokio::test]
async fn test_upsert_by_email() {
    let gateway = MockGateway::new();
    gateway.push(
        200,
        json!({
            "status": "COMPLETE",
            "results": [
                {"id": "20", "new": false, "properties": {"email": "old@example.com", "firstname": "Olga"}},
                {"id": "21", "new": true, "properties": {"email": "new@example.com", "firstname": "Nia"}}
            ]
        }),
    );
    let crm = crm(&gateway);

    let mut existing = new_contact("old@example.com");
    existing.set("firstname", "Olga");
    let mut fresh = new_contact("new@example.com");
    fresh.set("firstname", "Nia");

    let mut batch = Batch::new(vec![fresh, existing]).unwrap().with_id_property("email");
    assert!(batch.upsert(&crm).await.unwrap());

    assert_eq!(gateway.requests()[0].path, "/crm/v3/objects/contacts/batch/upsert");
    assert_eq!(
        inputs(&gateway, 0)[0],
        json!({
            "id": "new@example.com",
            "idProperty": "email",
            "properties": {"email": "new@example.com", "firstname": "Nia"}
        })
    );

    assert_eq!(batch.resources()[0].id(), Some(&RecordId::Int(21)));
    assert_eq!(batch.resources()[1].id(), Some(&RecordId::Int(20)));
}

#[tokio::test]
async fn test_upsert_custom_matcher() {
    let gateway = MockGateway::new();
    gateway.push(
        200,
        json!({"results": [{"id": "30", "new": false, "properties": {"email": "X@Example.com"}}]}),
    );
    let crm = crm(&gateway);

    let mut batch = Batch::new(vec![new_contact("x@example.com")])
        .unwrap()
        .with_id_property("email")
        .with_matcher(|record: &Record, result: &Value| {
            let remote = result["properties"]["email"].as_str().unwrap_or_default();
            record
                .email()
                .is_some_and(|local| local.eq_ignore_ascii_case(remote))
        });

    assert!(batch.upsert(&crm).await.unwrap());
    assert_eq!(batch.resources()[0].id(), Some(&RecordId::Int(30)));
}

#[tokio::test]
async fn test_partial_success() {
    let gateway = MockGateway::new();
    gateway.push(
        207,
        json!({
            "status": "COMPLETE",
            "results": [{"id": "1", "properties": {"name": "Alpha 2"}}],
            "errors": [{"status": "error", "message": "Object not found", "context": {"ids": ["2"]}}]
        }),
    );
    let crm = crm(&gateway);

    let mut first = stored(ResourceType::Company, 1, json!({"name": "Alpha"}));
    first.set("name", "Alpha 2");
    let mut second = stored(ResourceType::Company, 2, json!({"name": "Beta"}));
    second.set("name", "Beta 2");

    let mut batch = Batch::new(vec![first, second]).unwrap();
    assert!(batch.update(&crm).await.unwrap());

    assert!(batch.partial_success());
    assert!(!batch.all_successful());
    assert!(!batch.any_failed());
    assert_eq!(batch.responses()[0].errors().len(), 1);
    assert!(!batch.resources()[0].has_changes());
    assert!(batch.resources()[1].has_changes());
}

#[tokio::test]
async fn test_failed_chunk_is_an_error() {
    let gateway = MockGateway::new();
    gateway.push(400, json!({"message": "Property values were not valid"}));
    let crm = crm(&gateway);

    let mut batch = Batch::new(vec![new_contact("a@example.com")]).unwrap();
    let err = batch.create(&crm).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_archive_sends_ids_only() {
    let gateway = MockGateway::new();
    gateway.push(204, Value::Null);
    let crm = crm(&gateway);

    let records = vec![
        stored(ResourceType::Company, 1, json!({"name": "Alpha"})),
        stored(ResourceType::Company, 2, json!({"name": "Beta"})),
    ];
    let mut batch = Batch::new(records).unwrap();

    assert!(batch.archive(&crm).await.unwrap());
    assert_eq!(gateway.requests()[0].path, "/crm/v3/objects/companies/batch/archive");
    assert_eq!(inputs(&gateway, 0), vec![json!({"id": "1"}), json!({"id": "2"})]);
}

#[tokio::test]
async fn test_read_builds_a_batch() {
    let gateway = MockGateway::new();
    gateway.push(
        200,
        json!({
            "status": "COMPLETE",
            "results": [
                {"id": "1", "properties": {"email": "a@example.com"}},
                {"id": "2", "properties": {"email": "b@example.com"}}
            ]
        }),
    );
    let crm = crm(&gateway);

    let batch = Batch::read(&crm, "contacts", [1, 2], "id").await.unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.resource_type(), Some(ResourceType::Contact));
    assert_eq!(gateway.requests()[0].path, "/crm/v3/objects/contacts/batch/read");
    assert_eq!(gateway.body(0), json!({"inputs": [{"id": "1"}, {"id": "2"}]}));
}

#[tokio::test]
async fn test_read_rejects_unknown_resource_type() {
    let crm = unreachable_crm();
    let err = Batch::read(&crm, "tickets", [1], "id").await.unwrap_err();
    assert!(is_argument(&err));
}

#[tokio::test]
async fn test_batch_read_chunks_ids_and_passes_id_property() {
    let gateway = MockGateway::new();
    gateway.push(200, json!({"results": [{"id": "1", "properties": {"email": "e0@example.com"}}]}));
    gateway.push(200, json!({"results": [{"id": "2", "properties": {"email": "e149@example.com"}}]}));
    let crm = crm(&gateway);

    let emails: Vec<String> = (0..150).map(|i| format!("e{}@example.com", i)).collect();
    let reader = crm.contacts().batch_read(&emails, &["email"], "email");
    assert_eq!(reader.page_count(), 2);

    let records = reader.all().await.unwrap();
    assert_eq!(records.len(), 2);

    let first = gateway.body(0);
    assert_eq!(first["idProperty"], json!("email"));
    assert_eq!(first["properties"], json!(["email"]));
    assert_eq!(first["inputs"].as_array().map(Vec::len), Some(100));
    assert_eq!(gateway.body(1)["inputs"].as_array().map(Vec::len), Some(50));
}
