#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the portal server.
//!
//! These are serialized to JSON for the REST API. They are separate from
//! the domain types so the API contract can evolve independently; where a
//! domain type already has the right wire shape (markers, articles,
//! shapes) it is embedded directly.

use chrono::NaiveDateTime;
use civic_portal_calendar::DateRangeMode;
use civic_portal_content_models::ArticleStatus;
use civic_portal_geo_models::{LatLng, Marker, ReportDraft, Reporter};
use civic_portal_map::SaveReceipt;
use civic_portal_news::FeedWindow;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Whether the map SDK key is configured.
    pub maps_enabled: bool,
    /// Whether a remote document store is configured (otherwise state is
    /// session-local).
    pub persistence_enabled: bool,
}

/// Admin sign-in request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Admin account creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    /// Account email (must pass the admin allow-list).
    pub email: String,
    /// Account password.
    pub password: String,
    /// Optional display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A marker as returned by the list endpoint: the domain marker plus the
/// document version needed for a later guarded update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMarker {
    /// The marker.
    #[serde(flatten)]
    pub marker: Marker,
    /// Document version for optimistic-lock updates.
    pub version: u64,
}

/// Request body for creating a marker directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerInput {
    /// Display title.
    pub title: String,
    /// Category tag; defaults to `"other"`.
    #[serde(default)]
    pub category: Option<String>,
    /// Geographic position.
    pub position: LatLng,
    /// Optional overlay image.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Request body for editing a marker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerUpdate {
    /// New marker content.
    #[serde(flatten)]
    pub input: MarkerInput,
    /// The document version the edit was based on.
    pub expected_version: u64,
}

/// Query parameters for the visible-markers endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowQuery {
    /// Window mode; defaults to the store's current mode.
    #[serde(default)]
    pub mode: Option<DateRangeMode>,
    /// Anchor date; defaults to the store's current anchor.
    #[serde(default)]
    pub anchor: Option<NaiveDateTime>,
    /// Shift the window by this many periods after anchoring (negative
    /// for the past).
    #[serde(default)]
    pub shift: Option<i32>,
}

/// Response for the visible-markers endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVisibleMarkers {
    /// The window actually applied.
    pub start: NaiveDateTime,
    /// The window actually applied.
    pub end: NaiveDateTime,
    /// Human label for the window.
    pub label: String,
    /// Markers inside the window (plus undated legacy markers).
    pub markers: Vec<Marker>,
}

/// A report draft over the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Report title.
    #[serde(default)]
    pub title: String,
    /// Marker category; the page's selected type when absent.
    #[serde(default)]
    pub category: Option<String>,
    /// Explicit clicked point.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Explicit clicked point.
    #[serde(default)]
    pub lng: Option<f64>,
    /// Textual location encoding.
    #[serde(default)]
    pub location_text: Option<String>,
    /// Crime description.
    #[serde(default)]
    pub description: Option<String>,
    /// Crime type label.
    #[serde(default)]
    pub crime_type: Option<String>,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Uploaded attachment URLs.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Explicit marker image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Reporter identity; anonymous when absent.
    #[serde(default)]
    pub reported_by: Option<Reporter>,
}

impl From<ReportRequest> for ReportDraft {
    fn from(request: ReportRequest) -> Self {
        Self {
            title: request.title,
            category: request.category,
            lat: request.lat,
            lng: request.lng,
            location_text: request.location_text,
            description: request.description,
            crime_type: request.crime_type,
            address: request.address,
            attachments: request.attachments,
            image_url: request.image_url,
            reported_by: request.reported_by,
        }
    }
}

/// What a report save did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSaveReceipt {
    /// Id assigned to a persisted point marker.
    pub marker_id: Option<String>,
    /// Id assigned to a persisted crime report.
    pub crime_report_id: Option<String>,
    /// Whether a drawn shape was persisted.
    pub shape_saved: bool,
    /// Whether the draft produced anything (a location-less draft is a
    /// no-op).
    pub saved: bool,
    /// Remote-write failures to show as a notification.
    pub warnings: Vec<String>,
}

impl From<SaveReceipt> for ApiSaveReceipt {
    fn from(receipt: SaveReceipt) -> Self {
        Self {
            saved: receipt.saved_anything(),
            marker_id: receipt.marker_id,
            crime_report_id: receipt.crime_report_id,
            shape_saved: receipt.shape_saved,
            warnings: receipt.warnings,
        }
    }
}

/// Request body for filing a crime report directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeReportInput {
    /// Report headline.
    #[serde(default)]
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Crime type label.
    #[serde(default)]
    pub crime_type: Option<String>,
    /// Report location.
    pub location: LatLng,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Reporter identity; anonymous when absent.
    #[serde(default)]
    pub reported_by: Option<Reporter>,
    /// Attachment URLs.
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// An article as returned by the API: the domain article plus the
/// document version needed for a later guarded update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArticle {
    /// The article.
    #[serde(flatten)]
    pub article: civic_portal_content_models::NewsArticle,
    /// Document version for optimistic-lock updates.
    pub version: u64,
}

/// Query parameters for the article list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    /// Keep only this status.
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    /// Keep only this category.
    #[serde(default)]
    pub category: Option<String>,
    /// Substring search.
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for editing an article: the partial input plus the
/// version the edit was based on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    /// Fields to change; absent fields are left alone.
    #[serde(flatten)]
    pub input: civic_portal_content_models::ArticleInput,
    /// The document version the edit was based on.
    pub expected_version: u64,
}

/// Query parameters for the politics feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliticsQuery {
    /// Sliding window; defaults to a week.
    #[serde(default)]
    pub window: Option<FeedWindow>,
    /// Substring search.
    #[serde(default)]
    pub q: Option<String>,
}

/// Query parameters for the content list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuery {
    /// Keep only this status.
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    /// Substring search.
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for creating or updating a portal user.
///
/// With an `id` this replaces the stored user; without one it creates a
/// new account record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// Existing document id for updates.
    #[serde(default)]
    pub id: Option<String>,
    /// Account email.
    pub email: String,
    /// Display username.
    pub username: String,
    /// Account role; defaults to a regular user.
    #[serde(default)]
    pub role: Option<civic_portal_content_models::UserRole>,
    /// Whether the account is enabled; defaults to enabled.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Request body for creating or updating a content item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemInput {
    /// Existing document id for updates.
    #[serde(default)]
    pub id: Option<String>,
    /// Display title.
    pub title: String,
    /// Item kind; defaults to news.
    #[serde(default)]
    pub kind: Option<civic_portal_content_models::ContentKind>,
    /// Lifecycle status; defaults to draft.
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,
}

/// Request body for a bare status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// The new status.
    pub status: ArticleStatus,
}

/// Query parameters for the user list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    /// Substring search over email and username.
    #[serde(default)]
    pub q: Option<String>,
}

/// Query parameters for an upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// Target folder; defaults to `report-attachments`.
    #[serde(default)]
    pub folder: Option<String>,
    /// Original filename; defaults to `upload.bin`.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUpload {
    /// Public URL of the stored object.
    pub url: String,
}

/// View-count bump response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViews {
    /// The counter after the bump.
    pub views: u64,
}
