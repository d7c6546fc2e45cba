pub mod operations;
pub mod resolver;
pub mod status;
pub mod types;

pub use resolver::resolve;
pub use status::list_status;
pub use types::{Change, ChangeKind, FileEntry, RepositoryStatus, StatusReport};
