use git2::Repository;
use std::path::PathBuf;

/// Classification of a filesystem location with respect to version control.
///
/// Produced fresh on every path-change or save event and consumed by the
/// panel to pick its page. Never cached.
pub enum RepositoryStatus {
    /// The path is not inside any repository working tree (this includes
    /// paths that do not exist yet, e.g. an unsaved document).
    NoRepository,
    /// The path is inside a working tree; carries the open handle.
    Found(Repository),
    /// The backend itself failed in a way that is not "no repository here".
    /// The caller's remedy differs (fix the environment vs. offer to init),
    /// so this must stay distinguishable from `NoRepository`.
    Unavailable(String),
}

impl std::fmt::Debug for RepositoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryStatus::NoRepository => write!(f, "NoRepository"),
            RepositoryStatus::Found(repo) => {
                write!(f, "Found({:?})", repo.workdir().unwrap_or(repo.path()))
            }
            RepositoryStatus::Unavailable(reason) => write!(f, "Unavailable({reason:?})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    Untracked,
    Added,
    Deleted,
    Modified,
    Renamed,
}

/// One pending working-tree change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub path: PathBuf,
    /// New path for renames, `None` for every other kind.
    pub rename_target: Option<PathBuf>,
}

impl Change {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            rename_target: None,
        }
    }

    pub fn renamed(path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Renamed,
            path: path.into(),
            rename_target: Some(target.into()),
        }
    }

    /// Display form; renames show both sides.
    pub fn label(&self) -> String {
        match &self.rename_target {
            Some(target) => format!("{} -> {}", self.path.display(), target.display()),
            None => self.path.display().to_string(),
        }
    }
}

/// Snapshot of the repository's pending state, replaced wholesale on every
/// refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub untracked: Vec<PathBuf>,
    /// Grouped by kind in fixed order Added, Deleted, Modified, Renamed;
    /// backend order within each kind.
    pub changes: Vec<Change>,
}

impl StatusReport {
    /// A clean working tree disables the refresh/commit affordances.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}

/// One row of a panel checklist. Lives for the duration of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub selected: bool,
    pub kind: ChangeKind,
    /// Rename display target, carried so the row can render "<old> -> <new>".
    pub rename_target: Option<PathBuf>,
}

impl FileEntry {
    pub fn untracked(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            selected: false,
            kind: ChangeKind::Untracked,
            rename_target: None,
        }
    }

    pub fn from_change(change: &Change) -> Self {
        Self {
            path: change.path.clone(),
            selected: false,
            kind: change.kind,
            rename_target: change.rename_target.clone(),
        }
    }

    pub fn label(&self) -> String {
        match &self.rename_target {
            Some(target) => format!("{} -> {}", self.path.display(), target.display()),
            None => self.path.display().to_string(),
        }
    }
}
