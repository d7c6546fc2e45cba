use git2::Repository;
use std::env;
use std::fs;
use std::path::Path;

fn head_sha() -> Option<String> {
    let repo = Repository::open(".").ok()?;
    let head = repo.head().ok()?;
    let commit = head.peel_to_commit().ok()?;
    Some(commit.id().to_string())
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("git_sha.rs");

    let git_sha = head_sha().unwrap_or_else(|| "unknown".to_string());
    fs::write(
        &dest_path,
        format!("pub const GIT_SHA: &str = \"{git_sha}\";\n"),
    )
    .unwrap();
}
