//! Editor lifecycle glue: reacts to the host's path-changed and saved
//! notifications, keeps the panel pointed at the folder of the active
//! file, and hands panel selections to the write-side operations.
//!
//! The current repository handle lives here and is passed explicitly into
//! every operation; nothing reads it through hidden module state.

use crate::commit::{CommitCallback, CommitHandshake, HandshakeState};
use crate::git::operations;
use crate::git::{RepositoryStatus, resolve};
use crate::host::EditorHost;
use crate::panel::GitPanel;
use color_eyre::eyre::{Result, eyre};
use git2::Repository;
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct GitPlugin {
    pub panel: GitPanel,
    repo: Option<Repository>,
    active_dir: Option<PathBuf>,
    handshake: Option<Arc<CommitHandshake>>,
}

impl GitPlugin {
    pub fn new() -> Self {
        Self {
            panel: GitPanel::new(),
            repo: None,
            active_dir: None,
            handshake: None,
        }
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repo.as_ref()
    }

    /// The active surface changed; re-point the panel at the folder
    /// containing its backing file.
    pub fn active_path_changed(&mut self, path: &Path) {
        let dir = containing_dir(path);
        debug!("Active path changed, displaying for {dir:?}");
        self.active_dir = Some(dir.to_path_buf());

        let status = resolve(dir);
        self.panel.apply(&status);
        self.repo = match status {
            RepositoryStatus::Found(repo) => Some(repo),
            _ => None,
        };
    }

    /// A surface was saved. A save error is reported and leaves the panel
    /// alone; a clean save refreshes for the saved file's folder.
    pub fn document_saved(&mut self, path: &Path, save_error: Option<&str>) {
        if let Some(err) = save_error {
            error!("error saving {}: {err}", path.display());
            return;
        }
        self.active_path_changed(path);
    }

    /// Manual refresh of the current folder's panel.
    pub fn refresh(&mut self) {
        if let Some(repo) = &self.repo {
            self.panel.refresh(repo);
        }
    }

    /// Initialize a repository in the active folder (the Init page's
    /// button) and switch straight to the repository page.
    pub fn init_repository(&mut self) -> Result<()> {
        let dir = self
            .active_dir
            .clone()
            .ok_or_else(|| eyre!("no active folder to initialize"))?;
        let repo = operations::init_repository(&dir)?;
        self.panel.refresh(&repo);
        self.repo = Some(repo);
        Ok(())
    }

    /// Stage the untracked files ticked in the panel, then re-list.
    pub fn track_selected(&mut self) -> Result<()> {
        let paths = self.panel.view.selected_untracked();
        let repo = self.require_repo()?;
        operations::track_files(repo, &paths)?;
        self.refresh();
        Ok(())
    }

    /// Stage the changed files ticked in the panel, then re-list.
    pub fn stage_selected(&mut self) -> Result<()> {
        let paths = self.panel.view.selected_changes();
        let repo = self.require_repo()?;
        operations::stage_files(repo, &paths)?;
        self.refresh();
        Ok(())
    }

    pub fn stage_all(&mut self) -> Result<()> {
        let repo = self.require_repo()?;
        operations::stage_all(repo)?;
        self.refresh();
        Ok(())
    }

    /// Append the ticked untracked files to the ignore file, then re-list.
    pub fn ignore_selected(&mut self) -> Result<()> {
        let paths = self.panel.view.selected_untracked();
        let repo = self.require_repo()?;
        operations::ignore_files(repo, &paths)?;
        self.refresh();
        Ok(())
    }

    /// Start the commit handshake for the current repository.
    ///
    /// One commit in flight at a time: beginning a second handshake while
    /// one is still awaiting its surface close is refused with a visible
    /// error instead of opening a second edit surface.
    pub fn begin_commit(
        &mut self,
        host: &dyn EditorHost,
        on_complete: CommitCallback,
    ) -> Result<()> {
        if let Some(handshake) = &self.handshake
            && handshake.state() == HandshakeState::AwaitingClose
        {
            return Err(eyre!("a commit is already in progress"));
        }

        let repo = self.require_repo()?;
        let handshake = CommitHandshake::begin(host, repo, on_complete)?;
        self.handshake = Some(handshake);
        Ok(())
    }

    pub fn commit_in_progress(&self) -> bool {
        self.handshake
            .as_ref()
            .is_some_and(|h| h.state() == HandshakeState::AwaitingClose)
    }

    fn require_repo(&self) -> Result<&Repository> {
        self.repo
            .as_ref()
            .ok_or_else(|| eyre!("no repository for the current folder"))
    }
}

impl Default for GitPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory containing `path`: the path itself when it already is one,
/// otherwise its parent. A bare relative filename falls back to the path
/// unchanged and lets discovery sort it out.
fn containing_dir(path: &Path) -> &Path {
    if path.is_dir() {
        path
    } else {
        path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(path)
    }
}
