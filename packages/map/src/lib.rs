#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Map portal state: the marker store, the drawing-tool coordinator, and
//! the report save flow that turns drafts into persisted markers, crime
//! reports, and shapes.
//!
//! Local state is optimistic: saves land in memory immediately and the
//! remote write follows; deletes remove locally first and the remote
//! delete is best-effort. Remote write failures are surfaced to the
//! caller as warnings for a notification — never rolled back, never
//! retried automatically.

pub mod drawing;
pub mod report;
pub mod store;

pub use drawing::{DrawMode, DrawState, DrawingCoordinator, DrawingSurface, DrawnShape, OverlayId};
pub use report::{SaveReceipt, apply_marker_edit, delete_marker, save_report};
pub use store::MarkerStore;

use civic_portal_gateway::GatewayError;

/// Errors from map operations that must surface to the caller (as opposed
/// to the swallowed-read / warn-and-continue policy for loads).
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The underlying document store failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// An edit referenced a marker that is not in the local state.
    #[error("Unknown marker: {id}")]
    UnknownMarker {
        /// The marker id.
        id: String,
    },
}
