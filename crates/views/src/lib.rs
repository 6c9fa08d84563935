//! View state for the LogiTrack client: reconcilers that merge snapshots
//! with live updates, the page lifecycle that sequences them, and the
//! concrete pages.

pub mod error;
pub mod guard;
pub mod page;
pub mod pages;
pub mod reconciler;
pub mod sync;

pub use error::ViewError;
pub use guard::{require_admin, require_session, DashboardKind};
pub use page::{LiveOptions, Page, SnapshotSource};
pub use reconciler::{OrderList, Reconciler, TrackingSnapshot, TrackingView, WaitingQueue};
pub use sync::{LiveOutcome, SnapshotOutcome, SyncState};
