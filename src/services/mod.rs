//! Service layer: the visibility and correlation core.
//!
//! `registry` and `store` hold state, `reconcile` keeps the map in step with
//! it, `readiness` and `correlate` serve deep links, and `session` ties them
//! to a map widget and a file source.

pub mod correlate;
pub mod deep_link;
pub mod loader;
pub mod readiness;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod store;

// Re-export commonly used types and functions
pub use correlate::{find_exact, find_nearest, resolve, Activation, MatchKind};
pub use deep_link::DeepLink;
pub use loader::{load_file, DirectorySource, FileSource, LoadError};
pub use readiness::{wait_all_ready, Readiness};
pub use reconcile::ReconcileOutcome;
pub use registry::{reference_groups, CategoryRegistry, RegistryError};
pub use session::Session;
pub use store::{FileEntry, GroupState, LoadState, StoreError, VisibilityStore};
