//! The report save flow: draft → marker / crime report / shape.

use chrono::NaiveDateTime;
use civic_portal_gateway::{DocumentStore, GatewayError, collections};
use civic_portal_geo_models::{
    CrimeReport, LatLng, Marker, PENDING_INVESTIGATION, ReportDraft, Reporter, category,
};
use civic_portal_location::{ParsedLocation, parse_location};

use crate::{MapError, MarkerStore};

/// What a save actually did.
///
/// Local state is updated optimistically before the remote writes, so a
/// receipt can carry both results and warnings: a warning means the local
/// save stands but a remote write failed and should be retried manually.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SaveReceipt {
    /// Id assigned to a persisted point marker.
    pub marker_id: Option<String>,
    /// Index of the new marker in the store's full list.
    pub marker_index: Option<usize>,
    /// Id assigned to a persisted crime report.
    pub crime_report_id: Option<String>,
    /// `true` when a non-point shape was persisted.
    pub shape_saved: bool,
    /// Human-readable remote-write failures for a notification.
    pub warnings: Vec<String>,
}

impl SaveReceipt {
    /// Whether anything was saved at all (locally or remotely).
    #[must_use]
    pub const fn saved_anything(&self) -> bool {
        self.marker_index.is_some() || self.crime_report_id.is_some() || self.shape_saved
    }
}

/// Resolves the draft's location: the location text when it parses,
/// otherwise the explicit clicked point.
fn resolve_location(draft: &ReportDraft) -> Option<ParsedLocation> {
    let text = draft.location_text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        let (lat, lng) = (draft.lat?, draft.lng?);
        return Some(ParsedLocation::Point(LatLng::new(lat, lng)));
    }
    parse_location(text)
}

/// Saves a report draft.
///
/// A draft with no usable location is a no-op ([`SaveReceipt::default`]).
/// A point becomes a marker (inserted into local state immediately; the
/// remote write backfills the id). A crime-category draft additionally
/// files a crime report. A multi-point location persists a drawn shape —
/// two pairs are rectangle corners, per the location-text grammar.
///
/// Remote write failures do not fail the save: they are collected as
/// warnings on the receipt, matching the notify-and-retry-manually error
/// policy.
pub async fn save_report(
    draft: &ReportDraft,
    fallback_category: &str,
    store: &mut MarkerStore,
    gateway: &dyn DocumentStore,
    now: NaiveDateTime,
) -> SaveReceipt {
    let mut receipt = SaveReceipt::default();

    let Some(location) = resolve_location(draft) else {
        return receipt;
    };

    let title = {
        let trimmed = draft.title.trim();
        if trimmed.is_empty() {
            "Reported location".to_string()
        } else {
            trimmed.to_string()
        }
    };
    let marker_category = draft
        .category
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| fallback_category.to_string());

    let point = match &location {
        ParsedLocation::Point(p) => Some(*p),
        _ => None,
    };

    if let Some(point) = point {
        let marker = Marker {
            id: None,
            title: title.clone(),
            category: marker_category.clone(),
            position: point,
            image_url: draft.effective_image_url(),
            created_at: Some(now),
        };
        let index = store.insert(marker.clone());
        receipt.marker_index = Some(index);

        match serde_json::to_value(&marker) {
            Ok(value) => match gateway.insert(collections::MARKERS, value).await {
                Ok(doc) => {
                    store.backfill_id(index, &doc.id);
                    receipt.marker_id = Some(doc.id);
                }
                Err(e) => {
                    log::warn!("failed to persist marker: {e}");
                    receipt
                        .warnings
                        .push("Marker saved locally; persisting it failed".to_string());
                }
            },
            Err(e) => log::error!("marker serialization failed: {e}"),
        }
    }

    if marker_category == category::CRIME {
        let report = CrimeReport {
            id: None,
            title,
            description: draft.description.clone().unwrap_or_default(),
            crime_type: draft
                .crime_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            timestamp: now.and_utc().timestamp_millis(),
            location: point.unwrap_or_else(|| {
                LatLng::new(draft.lat.unwrap_or(0.0), draft.lng.unwrap_or(0.0))
            }),
            address: draft.address.clone().unwrap_or_default(),
            reported_by: draft.reported_by.clone().unwrap_or_else(Reporter::anonymous),
            status: PENDING_INVESTIGATION.to_string(),
            attachments: draft.attachments.clone(),
        };

        match serde_json::to_value(&report) {
            Ok(value) => match gateway.insert(collections::CRIME_REPORTS, value).await {
                Ok(doc) => receipt.crime_report_id = Some(doc.id),
                Err(e) => {
                    log::warn!("failed to persist crime report: {e}");
                    receipt
                        .warnings
                        .push("Saving the crime report failed".to_string());
                }
            },
            Err(e) => log::error!("crime report serialization failed: {e}"),
        }
    } else if let Some(shape) = location_to_shape(&location) {
        match serde_json::to_value(&shape) {
            Ok(value) => match gateway.insert(collections::SHAPES, value).await {
                Ok(_) => receipt.shape_saved = true,
                Err(e) => {
                    log::warn!("failed to persist shape: {e}");
                    receipt.warnings.push("Saving the shape failed".to_string());
                }
            },
            Err(e) => log::error!("shape serialization failed: {e}"),
        }
    }

    receipt
}

/// Applies an edit to a persisted marker: versioned remote update first,
/// then the local replacement.
///
/// # Errors
///
/// Returns [`MapError::UnknownMarker`] if the id is not in local state,
/// or the gateway error — notably
/// [`GatewayError::VersionConflict`](civic_portal_gateway::GatewayError::VersionConflict)
/// when someone else edited the marker since it was read.
pub async fn apply_marker_edit(
    store: &mut MarkerStore,
    gateway: &dyn DocumentStore,
    id: &str,
    marker: Marker,
    expected_version: u64,
) -> Result<(), MapError> {
    if !store.all().iter().any(|m| m.id.as_deref() == Some(id)) {
        return Err(MapError::UnknownMarker { id: id.to_string() });
    }

    let mut value = serde_json::to_value(&marker).map_err(GatewayError::from)?;
    // The id lives on the envelope, not in the document body.
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    gateway
        .update(collections::MARKERS, id, value, expected_version)
        .await?;

    let mut stored = marker;
    stored.id = Some(id.to_string());
    store.replace(id, stored);
    Ok(())
}

/// Deletes a marker: local removal is immediate, the remote delete is
/// best-effort. Returns whether the marker existed locally, plus a
/// warning when the remote delete failed.
pub async fn delete_marker(
    store: &mut MarkerStore,
    gateway: &dyn DocumentStore,
    id: &str,
) -> (bool, Option<String>) {
    let existed = store.delete(id);
    match gateway.delete(collections::MARKERS, id).await {
        Ok(()) => (existed, None),
        Err(e) => {
            log::error!("failed to delete marker {id} remotely: {e}");
            (existed, Some("Failed to delete from database".to_string()))
        }
    }
}

/// Converts a parsed multi-point location into its persisted shape.
fn location_to_shape(location: &ParsedLocation) -> Option<civic_portal_geo_models::Shape> {
    use civic_portal_geo_models::Shape;
    match location {
        ParsedLocation::Point(_) => None,
        ParsedLocation::Polygon(path) => Some(Shape::Polygon { path: path.clone() }),
        ParsedLocation::Polyline(path) => Some(Shape::Polyline { path: path.clone() }),
        ParsedLocation::Rectangle(sw, ne) => Some(Shape::Rectangle { path: [*sw, *ne] }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use civic_portal_calendar::DateRangeMode;
    use civic_portal_gateway::MemoryStore;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn store() -> MarkerStore {
        MarkerStore::new(now(), DateRangeMode::Week)
    }

    fn point_draft(text: &str) -> ReportDraft {
        ReportDraft {
            title: "Checkpoint".to_string(),
            category: Some("border".to_string()),
            location_text: Some(text.to_string()),
            ..ReportDraft::default()
        }
    }

    #[tokio::test]
    async fn point_draft_saves_marker_and_backfills_id() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let receipt = save_report(
            &point_draft("11.5,104.9"),
            "tourism",
            &mut markers,
            &gateway,
            now(),
        )
        .await;

        assert!(receipt.warnings.is_empty());
        let id = receipt.marker_id.expect("marker id assigned");
        assert_eq!(markers.visible()[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(markers.visible()[0].category, "border");
        assert_eq!(gateway.len(collections::MARKERS), 1);
    }

    #[tokio::test]
    async fn empty_location_is_a_noop() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let draft = ReportDraft {
            title: "nowhere".to_string(),
            location_text: Some("not coordinates".to_string()),
            ..ReportDraft::default()
        };
        let receipt = save_report(&draft, "tourism", &mut markers, &gateway, now()).await;

        assert!(!receipt.saved_anything());
        assert!(markers.all().is_empty());
        assert!(gateway.is_empty(collections::MARKERS));
    }

    #[tokio::test]
    async fn clicked_point_is_used_when_text_is_empty() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let draft = ReportDraft {
            lat: Some(11.5),
            lng: Some(104.9),
            ..ReportDraft::default()
        };
        let receipt = save_report(&draft, "tourism", &mut markers, &gateway, now()).await;

        assert!(receipt.marker_id.is_some());
        assert_eq!(markers.visible()[0].title, "Reported location");
    }

    #[tokio::test]
    async fn crime_draft_files_a_crime_report_too() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let draft = ReportDraft {
            title: "Robbery near market".to_string(),
            category: Some("crime".to_string()),
            location_text: Some("11.5,104.9".to_string()),
            crime_type: Some("Robbery".to_string()),
            attachments: vec!["https://cdn.example/p.jpg".to_string()],
            ..ReportDraft::default()
        };
        let receipt = save_report(&draft, "tourism", &mut markers, &gateway, now()).await;

        assert!(receipt.marker_id.is_some());
        assert!(receipt.crime_report_id.is_some());

        let docs = gateway.list(collections::CRIME_REPORTS, None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].value["status"], "Pending Investigation");
        assert_eq!(docs[0].value["reportedBy"]["userId"], "anonymous");
    }

    #[tokio::test]
    async fn two_pair_text_persists_a_rectangle_shape() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let draft = ReportDraft {
            location_text: Some("11.0,104.0; 12.0,105.0".to_string()),
            ..ReportDraft::default()
        };
        let receipt = save_report(&draft, "tourism", &mut markers, &gateway, now()).await;

        assert!(receipt.shape_saved);
        assert!(receipt.marker_id.is_none());

        let docs = gateway.list(collections::SHAPES, None).await.unwrap();
        assert_eq!(docs[0].value["type"], "rectangle");
        assert_eq!(docs[0].value["path"][0]["lat"], 11.0);
        assert_eq!(docs[0].value["path"][1]["lng"], 105.0);
    }

    #[tokio::test]
    async fn edit_with_stale_version_conflicts_and_keeps_local_state() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let receipt = save_report(
            &point_draft("11.5,104.9"),
            "tourism",
            &mut markers,
            &gateway,
            now(),
        )
        .await;
        let id = receipt.marker_id.unwrap();

        let mut edited = markers.visible()[0].clone();
        edited.title = "First edit".to_string();
        apply_marker_edit(&mut markers, &gateway, &id, edited.clone(), 1)
            .await
            .unwrap();

        // A second editor still holding version 1 loses.
        edited.title = "Conflicting edit".to_string();
        let err = apply_marker_edit(&mut markers, &gateway, &id, edited, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::Gateway(GatewayError::VersionConflict { .. })
        ));
        assert_eq!(markers.visible()[0].title, "First edit");
    }

    #[tokio::test]
    async fn delete_is_local_first_and_remote_best_effort() {
        let gateway = MemoryStore::new();
        let mut markers = store();

        let receipt = save_report(
            &point_draft("11.5,104.9"),
            "tourism",
            &mut markers,
            &gateway,
            now(),
        )
        .await;
        let id = receipt.marker_id.unwrap();

        let (existed, warning) = delete_marker(&mut markers, &gateway, &id).await;
        assert!(existed);
        assert!(warning.is_none());
        assert!(markers.all().is_empty());
        assert!(gateway.is_empty(collections::MARKERS));
    }
}
