// Library interface for gitpane
// This exposes modules for integration testing and for editor hosts
// embedding the panel core.

pub mod commit;
pub mod config;
pub mod git;
pub mod host;
pub mod logging;
pub mod panel;
pub mod plugin;

// Re-export commonly used types for easier embedding
pub use commit::{CommitHandshake, HandshakeState, normalize_message};
pub use git::{Change, ChangeKind, FileEntry, RepositoryStatus, StatusReport, resolve};
pub use host::{EditorHost, ObserverRegistry, SubscriptionId, SurfaceId, SurfaceObserver};
pub use panel::{GitPanel, PanelPage};
pub use plugin::GitPlugin;
