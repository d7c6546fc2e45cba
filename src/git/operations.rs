//! Write-side git operations built on git2: staging, tracking, ignoring,
//! committing, and repository initialization.
//!
//! Every operation here is synchronous and fail-visible; none of them
//! return updated status. Callers re-run `status::list_status` afterwards
//! to observe the new state.

use color_eyre::eyre::{Result, eyre};
use git2::{ErrorCode, Oid, Repository};
use log::debug;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The repository's working directory, or an error for bare repositories
/// (which the panel never operates on).
pub fn workdir(repo: &Repository) -> Result<PathBuf> {
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| eyre!("repository has no working directory"))
}

/// Convert an absolute path to a path relative to the repository root;
/// paths already relative (or outside the working tree) pass through.
pub fn to_repo_relative_path(repo: &Repository, path: &Path) -> PathBuf {
    match repo.workdir() {
        Some(workdir) => path
            .strip_prefix(workdir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf()),
        None => path.to_path_buf(),
    }
}

/// Stage the given working-tree paths into the index.
///
/// Deletions are staged by removing the path from the index, everything
/// else by adding it. An empty selection is a no-op, not an error. All
/// paths are attempted before the index is written; any failure rolls the
/// in-memory index back and reports every path that failed.
pub fn stage_files<P: AsRef<Path>>(repo: &Repository, paths: &[P]) -> Result<()> {
    if paths.is_empty() {
        debug!("stage_files called with empty selection, nothing to do");
        return Ok(());
    }

    let mut index = repo.index()?;
    let mut errors = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let gone = !repo
            .workdir()
            .map(|wd| wd.join(path).exists())
            .unwrap_or(false);

        let result = if gone {
            index.remove_path(path)
        } else {
            index.add_path(path)
        };
        if let Err(e) = result {
            errors.push(format!("{}: {e}", path.display()));
        }
    }

    if !errors.is_empty() {
        // Roll back by reloading the on-disk index.
        if let Err(e) = index.read(false) {
            debug!("Failed to reload index during rollback: {e}");
        }
        return Err(eyre!("failed to stage: {}", errors.join(", ")));
    }

    index.write()?;
    debug!("Staged {} path(s)", paths.len());
    Ok(())
}

/// Stage every path currently reported as changed, including both sides of
/// a rename.
pub fn stage_all(repo: &Repository) -> Result<()> {
    let report = super::status::list_status(repo)?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for change in &report.changes {
        paths.push(change.path.clone());
        if let Some(target) = &change.rename_target {
            paths.push(target.clone());
        }
    }

    stage_files(repo, &paths)
}

/// Add previously-untracked paths to the index. Mechanically identical to
/// staging; the distinction is only the source list the caller reads from.
pub fn track_files<P: AsRef<Path>>(repo: &Repository, paths: &[P]) -> Result<()> {
    stage_files(repo, paths)
}

/// Append each path as its own line to `<workdir>/.gitignore`.
///
/// Blind appending: no deduplication, no glob generation, no check that the
/// path already matches an existing pattern. The file is created if absent;
/// if its last byte is not a newline one is inserted first so an existing
/// partial line is never extended.
pub fn ignore_files<P: AsRef<Path>>(repo: &Repository, paths: &[P]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    let ignore_path = workdir(repo)?.join(".gitignore");
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(&ignore_path)?;

    if !ends_with_newline(&mut file)? {
        file.write_all(b"\n")?;
    }

    for path in paths {
        writeln!(file, "{}", path.as_ref().display())?;
    }

    debug!(
        "Appended {} entrie(s) to {}",
        paths.len(),
        ignore_path.display()
    );
    Ok(())
}

fn ends_with_newline(file: &mut std::fs::File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        // Empty or freshly created: nothing to terminate.
        return Ok(true);
    }

    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    file.seek(SeekFrom::End(0))?;
    Ok(last[0] == b'\n')
}

/// Commit the staged index with the given message.
///
/// Rejects an empty message and an index with nothing staged; both are
/// surfaced to the caller rather than producing a pointless commit.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid> {
    if message.trim().is_empty() {
        return Err(eyre!("commit message is empty"));
    }

    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    // Unborn branch (no commits yet) commits without a parent.
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    if let Some(ref parent) = parent
        && parent.tree_id() == tree_id
    {
        return Err(eyre!("nothing staged to commit"));
    }

    let signature = repo.signature()?;
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    let oid = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )?;

    debug!("Created commit {oid}");
    Ok(oid)
}

/// The current HEAD commit id, if the repository has one.
pub fn head_commit_id(repo: &Repository) -> Option<String> {
    repo.head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .map(|commit| commit.id().to_string())
}

/// Initialize a new repository at `path` (the Init page's affordance).
pub fn init_repository(path: &Path) -> Result<Repository> {
    debug!("Initializing repository at {path:?}");
    Ok(Repository::init(path)?)
}
