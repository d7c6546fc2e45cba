//! Status enumeration (read side): untracked files plus pending changes,
//! grouped by kind in a fixed order.

use super::types::{Change, ChangeKind, StatusReport};
use color_eyre::eyre::Result;
use git2::{Repository, StatusEntry, StatusOptions};
use log::debug;
use std::path::PathBuf;

/// Enumerate the repository's untracked files and pending changes.
///
/// No side effects; safe to invoke repeatedly (manual refresh, post-mutation
/// refresh). `changes` comes back grouped Added, Deleted, Modified, Renamed,
/// keeping the backend's order within each group. A clean working tree
/// yields an empty `changes` list.
pub fn list_status(repo: &Repository) -> Result<StatusReport> {
    let statuses = repo.statuses(Some(
        StatusOptions::new()
            .include_ignored(false)
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .renames_head_to_index(true)
            .renames_index_to_workdir(true),
    ))?;
    debug!("Found {} status entries", statuses.len());

    let mut untracked = Vec::new();
    let mut added = Vec::new();
    let mut deleted = Vec::new();
    let mut modified = Vec::new();
    let mut renamed = Vec::new();

    for entry in statuses.iter() {
        let status = entry.status();
        let path = PathBuf::from(entry.path().unwrap_or(""));

        if status.is_wt_new() {
            untracked.push(path);
            continue;
        }

        if status.is_wt_renamed() || status.is_index_renamed() {
            renamed.push(rename_change(&entry, path));
        } else if status.is_wt_deleted() || status.is_index_deleted() {
            deleted.push(Change::new(ChangeKind::Deleted, path));
        } else if status.is_index_new() {
            added.push(Change::new(ChangeKind::Added, path));
        } else if status.is_wt_modified()
            || status.is_index_modified()
            || status.is_wt_typechange()
            || status.is_index_typechange()
        {
            modified.push(Change::new(ChangeKind::Modified, path));
        }
    }

    let mut changes = added;
    changes.append(&mut deleted);
    changes.append(&mut modified);
    changes.append(&mut renamed);

    debug!(
        "Status: {} untracked, {} changes",
        untracked.len(),
        changes.len()
    );

    Ok(StatusReport { untracked, changes })
}

/// Pull original and new path out of the rename's diff delta. The status
/// entry path is the post-rename side, so fall back to it if the deltas are
/// missing.
fn rename_change(entry: &StatusEntry<'_>, fallback: PathBuf) -> Change {
    let delta = entry.index_to_workdir().or_else(|| entry.head_to_index());

    match delta {
        Some(delta) => {
            let old = delta
                .old_file()
                .path()
                .map(PathBuf::from)
                .unwrap_or_else(|| fallback.clone());
            let new = delta
                .new_file()
                .path()
                .map(PathBuf::from)
                .unwrap_or(fallback);
            Change::renamed(old, new)
        }
        None => Change::new(ChangeKind::Renamed, fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::super::operations::tests::{create_commit, create_test_repo};
    use super::*;
    use std::fs;
    use std::path::Path;

    #[test]
    fn untracked_file_is_listed_without_changes() -> Result<()> {
        let (_temp_dir, repo, repo_path) = create_test_repo()?;
        create_commit(&repo, &repo_path, "base.txt", "base", "Initial commit")?;

        fs::write(repo_path.join("a.txt"), "hello")?;

        let report = list_status(&repo)?;
        assert_eq!(report.untracked, vec![PathBuf::from("a.txt")]);
        assert!(report.changes.is_empty());
        assert!(report.is_clean());

        Ok(())
    }

    #[test]
    fn listing_is_idempotent_without_mutation() -> Result<()> {
        let (_temp_dir, repo, repo_path) = create_test_repo()?;
        create_commit(&repo, &repo_path, "base.txt", "base", "Initial commit")?;

        fs::write(repo_path.join("base.txt"), "edited")?;
        fs::write(repo_path.join("new.txt"), "new")?;

        let first = list_status(&repo)?;
        let second = list_status(&repo)?;
        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn changes_are_grouped_in_fixed_kind_order() -> Result<()> {
        let (_temp_dir, repo, repo_path) = create_test_repo()?;
        create_commit(&repo, &repo_path, "modify.txt", "before", "c1")?;
        create_commit(&repo, &repo_path, "delete.txt", "doomed", "c2")?;

        // Modified (working tree), deleted (working tree), added (index).
        fs::write(repo_path.join("modify.txt"), "after")?;
        fs::remove_file(repo_path.join("delete.txt"))?;
        fs::write(repo_path.join("add.txt"), "fresh")?;
        let mut index = repo.index()?;
        index.add_path(Path::new("add.txt"))?;
        index.write()?;

        let report = list_status(&repo)?;
        let kinds: Vec<ChangeKind> = report.changes.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Added, ChangeKind::Deleted, ChangeKind::Modified]
        );
        assert!(report.untracked.is_empty());

        Ok(())
    }

    #[test]
    fn staged_rename_reports_both_paths() -> Result<()> {
        let (_temp_dir, repo, repo_path) = create_test_repo()?;
        create_commit(&repo, &repo_path, "old.txt", "same content here", "c1")?;

        fs::rename(repo_path.join("old.txt"), repo_path.join("new.txt"))?;
        let mut index = repo.index()?;
        index.remove_path(Path::new("old.txt"))?;
        index.add_path(Path::new("new.txt"))?;
        index.write()?;

        let report = list_status(&repo)?;
        let rename = report
            .changes
            .iter()
            .find(|c| c.kind == ChangeKind::Renamed)
            .expect("rename entry");
        assert_eq!(rename.label(), "old.txt -> new.txt");

        Ok(())
    }
}
