//! Device surface against the in-memory service.

use std::sync::Arc;

use websql_client::ControlEndpoint;
use websql_device::{DeviceService, EventDispatcher, FileStore};
use websql_testkit::MemoryService;

fn endpoint(service: &MemoryService) -> Arc<dyn ControlEndpoint> {
    Arc::new(service.clone())
}

#[test]
fn file_proxy_round_trips_through_the_service() {
    let service = MemoryService::new();
    let store = FileStore::new(endpoint(&service));

    store.write("log.txt", "first", false).unwrap();
    store.write("log.txt", " second", true).unwrap();
    assert_eq!(store.read("log.txt"), "first second");
    assert_eq!(service.file_content("log.txt"), Some("first second".into()));
}

#[test]
fn truncating_write_replaces_the_content() {
    let service = MemoryService::new();
    let store = FileStore::new(endpoint(&service));

    store.write("log.txt", "old", false).unwrap();
    store.write("log.txt", "new", false).unwrap();
    assert_eq!(store.read("log.txt"), "new");
}

#[test]
fn missing_file_reads_as_empty() {
    let service = MemoryService::new();
    let store = FileStore::new(endpoint(&service));
    assert_eq!(store.read("missing.txt"), "");
}

#[test]
fn remove_all_databases_clears_the_service() {
    let service = MemoryService::new();
    // Seed one database through the control surface.
    let request = serde_json::json!({
        "name": "notes",
        "version": "1.0",
        "displayName": "Notes",
        "estimatedSize": 1024,
        "hasCreationCallback": false
    });
    service
        .post(websql_protocol::routes::OPEN, &request.to_string())
        .unwrap();
    assert_eq!(service.database_count(), 1);

    let device = DeviceService::new(endpoint(&service), Arc::new(EventDispatcher::new()));
    device.remove_all_databases().unwrap();
    assert_eq!(service.database_count(), 0);
}
