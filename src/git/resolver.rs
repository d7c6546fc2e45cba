//! Repository resolution: classify a filesystem path as inside a working
//! tree, outside any repository, or unreachable because the backend failed.

use super::types::RepositoryStatus;
use git2::{ErrorCode, Repository};
use log::debug;
use std::path::Path;

/// Classify `path` by attempting to discover a repository rooted at or
/// above it.
///
/// Pure, synchronous query with no filesystem side effects and no retries.
/// A path that does not exist yet (unsaved document) is `NoRepository`:
/// discovery walks up from the nearest existing ancestor and either finds a
/// working tree or reports not-found. Any backend error other than
/// not-found is an environment problem and maps to `Unavailable`.
pub fn resolve(path: &Path) -> RepositoryStatus {
    debug!("Resolving repository for path: {path:?}");

    let start = nearest_existing_ancestor(path);

    match Repository::discover(start) {
        Ok(repo) => {
            if repo.workdir().is_none() {
                // Bare repository: nothing for a working-tree panel to act on.
                debug!("Discovered bare repository at {:?}", repo.path());
                return RepositoryStatus::NoRepository;
            }
            debug!("Repository found at {:?}", repo.workdir());
            RepositoryStatus::Found(repo)
        }
        Err(e) if e.code() == ErrorCode::NotFound => {
            debug!("No repository above {path:?}");
            RepositoryStatus::NoRepository
        }
        Err(e) => {
            debug!("Backend unavailable resolving {path:?}: {e}");
            RepositoryStatus::Unavailable(e.message().to_string())
        }
    }
}

/// Walk up until a component that exists on disk, so discovery for a
/// not-yet-saved file still starts somewhere meaningful.
fn nearest_existing_ancestor(path: &Path) -> &Path {
    let mut current = path;
    while !current.exists() {
        match current.parent() {
            Some(parent) => current = parent,
            None => return path,
        }
    }
    current
}
