//! Integration tests for the commit handshake over a mock editor host.

use color_eyre::eyre::Result;
use git2::{Oid, Repository};
use gitpane::commit::{CommitHandshake, HandshakeState};
use gitpane::host::{EditorHost, ObserverRegistry, SubscriptionId, SurfaceId, SurfaceObserver};
use gitpane::plugin::GitPlugin;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory editor host: tests decide when a surface closes and with what
/// buffer content.
struct MockHost {
    next_surface: AtomicU64,
    opened: Mutex<Vec<(SurfaceId, PathBuf)>>,
    buffers: Mutex<HashMap<SurfaceId, String>>,
    registry: ObserverRegistry,
}

impl MockHost {
    fn new() -> Self {
        Self {
            next_surface: AtomicU64::new(0),
            opened: Mutex::new(Vec::new()),
            buffers: Mutex::new(HashMap::new()),
            registry: ObserverRegistry::new(),
        }
    }

    fn close_surface(&self, id: SurfaceId, text: &str) {
        self.buffers.lock().unwrap().insert(id, text.to_string());
        self.registry.notify_closed(id, self);
        self.buffers.lock().unwrap().remove(&id);
    }

    fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }
}

impl EditorHost for MockHost {
    fn open_surface(&self, path: &Path) -> Result<SurfaceId> {
        let id = SurfaceId(self.next_surface.fetch_add(1, Ordering::Relaxed));
        self.opened.lock().unwrap().push((id, path.to_path_buf()));
        Ok(id)
    }

    fn surface_text(&self, id: SurfaceId) -> Result<String> {
        Ok(self
            .buffers
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn subscribe_closed(&self, observer: Arc<dyn SurfaceObserver>) -> SubscriptionId {
        self.registry.subscribe(observer)
    }

    fn unsubscribe_closed(&self, subscription: SubscriptionId) {
        self.registry.unsubscribe(subscription)
    }
}

fn create_test_repo() -> (TempDir, Repository, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();
    let repo = Repository::init(&repo_path).unwrap();

    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    (temp_dir, repo, repo_path)
}

fn stage_new_file(repo: &Repository, repo_path: &Path, name: &str, content: &str) {
    fs::write(repo_path.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
}

type SharedResult = Arc<Mutex<Option<Result<Oid>>>>;

fn capture() -> (SharedResult, Arc<AtomicUsize>, gitpane::commit::CommitCallback) {
    let slot: SharedResult = Arc::new(Mutex::new(None));
    let calls = Arc::new(AtomicUsize::new(0));
    let cb_slot = slot.clone();
    let cb_calls = calls.clone();
    let callback = Box::new(move |result: Result<Oid>| {
        cb_calls.fetch_add(1, Ordering::SeqCst);
        *cb_slot.lock().unwrap() = Some(result);
    });
    (slot, calls, callback)
}

#[test]
fn begin_opens_the_staging_file_as_a_surface() {
    let (_temp_dir, repo, repo_path) = create_test_repo();
    stage_new_file(&repo, &repo_path, "a.txt", "content");

    let host = MockHost::new();
    let (_slot, _calls, callback) = capture();
    let handshake = CommitHandshake::begin(&host, &repo, callback).unwrap();

    assert_eq!(handshake.state(), HandshakeState::AwaitingClose);
    let opened = host.opened_paths();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].ends_with("COMMIT_EDITMSG"));
    assert_eq!(host.subscriber_count(), 1);
}

#[test]
fn closing_a_different_surface_changes_nothing() {
    let (_temp_dir, repo, repo_path) = create_test_repo();
    stage_new_file(&repo, &repo_path, "a.txt", "content");

    let host = MockHost::new();
    let (slot, calls, callback) = capture();
    let handshake = CommitHandshake::begin(&host, &repo, callback).unwrap();
    let target = handshake.target();

    // A foreign surface closes; the handshake keeps waiting.
    let other = host.open_surface(Path::new("/elsewhere/file.txt")).unwrap();
    assert_ne!(other, target);
    host.close_surface(other, "not a commit message");

    assert_eq!(handshake.state(), HandshakeState::AwaitingClose);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(slot.lock().unwrap().is_none());

    // Now the real one closes and the commit lands, normalized.
    host.close_surface(target, "Fix bug\n# comment\n\nDone");
    assert_eq!(handshake.state(), HandshakeState::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let oid = slot.lock().unwrap().take().unwrap().unwrap();
    let commit = repo.find_commit(oid).unwrap();
    assert_eq!(commit.message().unwrap(), "Fix bug\nDone");
}

#[test]
fn completion_unsubscribes_and_fires_exactly_once() {
    let (_temp_dir, repo, repo_path) = create_test_repo();
    stage_new_file(&repo, &repo_path, "a.txt", "content");

    let host = MockHost::new();
    let (_slot, calls, callback) = capture();
    let handshake = CommitHandshake::begin(&host, &repo, callback).unwrap();
    let target = handshake.target();

    host.close_surface(target, "First message");
    assert_eq!(host.subscriber_count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A late duplicate notification delivered directly to the observer is
    // ignored; the callback cannot fire twice.
    handshake.surface_closed(target, &host);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(handshake.state(), HandshakeState::Idle);
}

#[test]
fn all_comment_buffer_fails_the_commit_but_still_cleans_up() {
    let (_temp_dir, repo, repo_path) = create_test_repo();
    stage_new_file(&repo, &repo_path, "a.txt", "content");

    let host = MockHost::new();
    let (slot, calls, callback) = capture();
    let handshake = CommitHandshake::begin(&host, &repo, callback).unwrap();

    host.close_surface(handshake.target(), "# everything here\n# is a comment\n");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let result = slot.lock().unwrap().take().unwrap();
    assert!(result.is_err());
    assert_eq!(handshake.state(), HandshakeState::Idle);
    assert_eq!(host.subscriber_count(), 0);
}

#[test]
fn nothing_staged_fails_the_commit_visibly() {
    let (_temp_dir, repo, repo_path) = create_test_repo();
    // One commit so HEAD exists, then nothing staged on top of it.
    stage_new_file(&repo, &repo_path, "a.txt", "content");
    {
        let mut index = repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "setup", &tree, &[]).unwrap();
    }

    let host = MockHost::new();
    let (slot, _calls, callback) = capture();
    let handshake = CommitHandshake::begin(&host, &repo, callback).unwrap();

    host.close_surface(handshake.target(), "A perfectly fine message");

    let result = slot.lock().unwrap().take().unwrap();
    let err = result.unwrap_err();
    assert!(err.to_string().contains("nothing staged"));
}

#[test]
fn plugin_refuses_a_second_commit_in_flight() {
    let (_temp_dir, repo, repo_path) = create_test_repo();
    stage_new_file(&repo, &repo_path, "a.txt", "content");
    drop(repo);

    let mut plugin = GitPlugin::new();
    plugin.active_path_changed(&repo_path.join("a.txt"));

    let host = MockHost::new();
    let (_slot, calls, callback) = capture();
    plugin.begin_commit(&host, callback).unwrap();
    assert!(plugin.commit_in_progress());

    let (_slot2, _calls2, second_callback) = capture();
    let err = plugin.begin_commit(&host, second_callback).unwrap_err();
    assert!(err.to_string().contains("already in progress"));

    // Once the first handshake completes, a new one is allowed.
    let target = host.opened.lock().unwrap()[0].0;
    host.close_surface(target, "Land the staged file");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!plugin.commit_in_progress());

    let (_slot3, _calls3, third_callback) = capture();
    plugin.begin_commit(&host, third_callback).unwrap();
}
