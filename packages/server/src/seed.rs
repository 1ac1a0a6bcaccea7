//! Seed data for memory-backed deployments.
//!
//! The users and content collections have no remote counterpart, so a
//! fresh in-memory gateway is primed with the same sample rows the admin
//! console has always shown. The map gets its default marker at the
//! portal's home coordinates.

use chrono::NaiveDateTime;
use civic_portal_gateway::{DocumentStore, MemoryStore, collections};
use civic_portal_geo_models::{LatLng, Marker};
use civic_portal_map::MarkerStore;
use serde_json::json;

/// The map's home position.
pub const DEFAULT_CENTER: LatLng = LatLng::new(11.5564, 104.9282);

/// Inserts the sample users and content items.
pub async fn seed_admin_mock_data(store: &MemoryStore) {
    let users = [
        json!({
            "email": "john.doe@example.com",
            "username": "johndoe",
            "role": "user",
            "createdAt": "2024-01-15T00:00:00",
            "lastActive": "2024-12-23T00:00:00",
            "isActive": true,
        }),
        json!({
            "email": "jane.smith@example.com",
            "username": "janesmith",
            "role": "moderator",
            "createdAt": "2024-02-10T00:00:00",
            "lastActive": "2024-12-22T00:00:00",
            "isActive": true,
        }),
        json!({
            "email": "bob.wilson@example.com",
            "username": "bobwilson",
            "role": "user",
            "createdAt": "2024-03-05T00:00:00",
            "lastActive": "2024-12-20T00:00:00",
            "isActive": false,
        }),
    ];

    let content = [
        json!({
            "title": "Government announces new border security measures",
            "kind": "news",
            "status": "published",
            "author": "Admin",
            "createdAt": "2024-12-20T00:00:00",
            "updatedAt": "2024-12-22T00:00:00",
            "viewCount": 1250,
        }),
        json!({
            "title": "Economic development plans for 2025",
            "kind": "article",
            "status": "published",
            "author": "Editor",
            "createdAt": "2024-12-18T00:00:00",
            "viewCount": 890,
        }),
        json!({
            "title": "System maintenance announcement",
            "kind": "announcement",
            "status": "draft",
            "author": "Admin",
            "createdAt": "2024-12-23T00:00:00",
            "viewCount": 0,
        }),
    ];

    for user in users {
        if let Err(e) = store.insert(collections::USERS, user).await {
            log::warn!("failed to seed user: {e}");
        }
    }
    for item in content {
        if let Err(e) = store.insert(collections::CONTENT, item).await {
            log::warn!("failed to seed content item: {e}");
        }
    }
    log::debug!("seeded sample users and content");
}

/// Inserts the default marker shown before any data loads.
pub fn seed_default_marker(store: &mut MarkerStore, now: NaiveDateTime) {
    store.insert(Marker {
        id: None,
        title: "Default marker".to_string(),
        category: "tourism".to_string(),
        position: DEFAULT_CENTER,
        image_url: None,
        created_at: Some(now),
    });
}
