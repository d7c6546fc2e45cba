//! Panel-page selection and the checklist model behind the repository page.
//!
//! The panel is a notebook of three pages: an init prompt for folders
//! outside version control, the repository view, and an error page for a
//! broken backend. Which page shows is a pure function of the resolver's
//! classification; the repository page's contents are plain `FileEntry`
//! records rebuilt wholesale on every refresh, decoupled from any
//! rendering concern.

use crate::git::types::{FileEntry, RepositoryStatus, StatusReport};
use crate::git::{list_status, operations};
use git2::Repository;
use log::debug;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPage {
    /// Not version controlled; offer to initialize a repository.
    Init,
    /// Inside a working tree; show the status checklists.
    Repo,
    /// The backend itself is broken; show the reason, persistently.
    Error,
}

impl PanelPage {
    pub fn for_status(status: &RepositoryStatus) -> Self {
        match status {
            RepositoryStatus::NoRepository => PanelPage::Init,
            RepositoryStatus::Found(_) => PanelPage::Repo,
            RepositoryStatus::Unavailable(_) => PanelPage::Error,
        }
    }
}

/// Contents of the repository page: two independent checklists over the
/// current status snapshot.
#[derive(Debug, Default)]
pub struct RepoView {
    pub untracked: Vec<FileEntry>,
    pub changes: Vec<FileEntry>,
    pub head: Option<String>,
}

impl RepoView {
    /// Replace both checklists from a fresh status report. Previous
    /// selections do not survive a refresh; the entries they pointed at may
    /// no longer exist.
    pub fn update(&mut self, report: &StatusReport, head: Option<String>) {
        self.untracked = report
            .untracked
            .iter()
            .map(|path| FileEntry::untracked(path.clone()))
            .collect();
        self.changes = report.changes.iter().map(FileEntry::from_change).collect();
        self.head = head;
        debug!(
            "Repo view updated: {} untracked, {} changes",
            self.untracked.len(),
            self.changes.len()
        );
    }

    /// A clean view disables the commit affordance.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn toggle_untracked(&mut self, index: usize) {
        if let Some(entry) = self.untracked.get_mut(index) {
            entry.selected = !entry.selected;
        }
    }

    pub fn toggle_change(&mut self, index: usize) {
        if let Some(entry) = self.changes.get_mut(index) {
            entry.selected = !entry.selected;
        }
    }

    /// Select the entry for `path` in either checklist. Returns false if no
    /// row carries that path.
    pub fn select_path(&mut self, path: &Path) -> bool {
        for entry in self.untracked.iter_mut().chain(self.changes.iter_mut()) {
            if entry.path == path {
                entry.selected = true;
                return true;
            }
        }
        false
    }

    pub fn selected_untracked(&self) -> Vec<PathBuf> {
        selected_paths(&self.untracked)
    }

    pub fn selected_changes(&self) -> Vec<PathBuf> {
        selected_paths(&self.changes)
    }
}

fn selected_paths(entries: &[FileEntry]) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|e| e.selected)
        .map(|e| e.path.clone())
        .collect()
}

/// The notebook itself: current page plus the data each page displays.
#[derive(Debug, Default)]
pub struct GitPanel {
    page: Option<PanelPage>,
    error: Option<String>,
    pub view: RepoView,
}

impl GitPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Option<PanelPage> {
        self.page
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Route a resolver classification to a page, refreshing the repository
    /// view when a working tree is present. A listing failure degrades to
    /// the error page rather than propagating; the panel must never take
    /// the host down.
    pub fn apply(&mut self, status: &RepositoryStatus) {
        match status {
            RepositoryStatus::NoRepository => self.show_init(),
            RepositoryStatus::Unavailable(reason) => self.show_error(reason.clone()),
            RepositoryStatus::Found(repo) => self.refresh(repo),
        }
    }

    pub fn show_init(&mut self) {
        self.page = Some(PanelPage::Init);
        self.error = None;
    }

    pub fn show_error(&mut self, reason: String) {
        debug!("Panel switching to error page: {reason}");
        self.page = Some(PanelPage::Error);
        self.error = Some(reason);
    }

    /// Rebuild the repository page from the current working-tree state.
    pub fn refresh(&mut self, repo: &Repository) {
        match list_status(repo) {
            Ok(report) => {
                self.view.update(&report, operations::head_commit_id(repo));
                self.page = Some(PanelPage::Repo);
                self.error = None;
            }
            Err(e) => self.show_error(format!("failed to list status: {e}")),
        }
    }

    /// Plain-text rendering of the current page, one row per line. This is
    /// what the CLI shell prints; a GUI host reads the structured view
    /// instead.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.page {
            None => out.push_str("(no folder selected)\n"),
            Some(PanelPage::Init) => {
                out.push_str("Not a repository. Run with --init to create one.\n");
            }
            Some(PanelPage::Error) => {
                let reason = self.error.as_deref().unwrap_or("unknown error encountered");
                let _ = writeln!(out, "git backend unavailable: {reason}");
            }
            Some(PanelPage::Repo) => {
                if let Some(head) = &self.view.head {
                    let _ = writeln!(out, "HEAD: {}", &head[..7.min(head.len())]);
                }
                let _ = writeln!(out, "Untracked Files:");
                if self.view.untracked.is_empty() {
                    out.push_str("  (none)\n");
                }
                for entry in &self.view.untracked {
                    let mark = if entry.selected { 'x' } else { ' ' };
                    let _ = writeln!(out, "  [{mark}] {}", entry.label());
                }
                let _ = writeln!(out, "Changes:");
                if self.view.changes.is_empty() {
                    out.push_str("  (clean)\n");
                }
                for entry in &self.view.changes {
                    let mark = if entry.selected { 'x' } else { ' ' };
                    let _ = writeln!(out, "  [{mark}] {:?} {}", entry.kind, entry.label());
                }
            }
        }
        out
    }
}
