//! The commit handshake: open the repository's commit-message staging file
//! as an editing surface, then commit the normalized buffer exactly once
//! when that surface is closed.
//!
//! One handshake is one disposable object: `Idle -> AwaitingClose -> Idle`,
//! with a fresh instance per commit attempt. The internal mutex covers the
//! two sequences that must be atomic: recording the subscription handle at
//! registration (so a close arriving mid-registration cannot strand the
//! subscription), and the read-normalize-commit-unsubscribe sequence at
//! completion.

use crate::git::operations;
use crate::host::{EditorHost, SubscriptionId, SurfaceId, SurfaceObserver};
use color_eyre::eyre::Result;
use git2::{Oid, Repository};
use log::{debug, error};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Name of the staging file inside the git metadata directory.
pub const COMMIT_EDITMSG: &str = "COMMIT_EDITMSG";

/// Fired exactly once with the outcome of the commit.
pub type CommitCallback = Box<dyn FnOnce(Result<Oid>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingClose,
    Idle,
}

struct HandshakeInner {
    subscription: Option<SubscriptionId>,
    /// Taken out under the lock at completion; `None` means the handshake
    /// already finished and guarantees the callback cannot fire twice.
    on_complete: Option<CommitCallback>,
}

/// A single in-flight "edit the message, commit on close" interaction.
///
/// The target surface identifier is fixed at creation and never changes.
/// The repository is reopened from its working directory at commit time
/// rather than held across the wait, which can last indefinitely (no
/// timeout exists; the only way out is closing the surface).
pub struct CommitHandshake {
    target: SurfaceId,
    workdir: PathBuf,
    inner: Mutex<HandshakeInner>,
}

impl CommitHandshake {
    /// Open `<git_dir>/COMMIT_EDITMSG` as an editing surface and register
    /// for its close.
    ///
    /// The subscription is taken and its handle recorded while the lock is
    /// held, so a surface-closed notification delivered concurrently with
    /// registration always finds the handle it needs to unsubscribe.
    pub fn begin(
        host: &dyn EditorHost,
        repo: &Repository,
        on_complete: CommitCallback,
    ) -> Result<Arc<Self>> {
        let workdir = operations::workdir(repo)?;
        let staging_file = repo.path().join(COMMIT_EDITMSG);

        let target = host.open_surface(&staging_file)?;
        debug!("Commit handshake opened surface {target:?} on {staging_file:?}");

        let handshake = Arc::new(Self {
            target,
            workdir,
            inner: Mutex::new(HandshakeInner {
                subscription: None,
                on_complete: Some(on_complete),
            }),
        });

        {
            let mut inner = handshake.lock();
            let observer: Arc<dyn SurfaceObserver> = handshake.clone();
            inner.subscription = Some(host.subscribe_closed(observer));
        }

        Ok(handshake)
    }

    pub fn state(&self) -> HandshakeState {
        if self.lock().on_complete.is_some() {
            HandshakeState::AwaitingClose
        } else {
            HandshakeState::Idle
        }
    }

    pub fn target(&self) -> SurfaceId {
        self.target
    }

    fn lock(&self) -> MutexGuard<'_, HandshakeInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SurfaceObserver for CommitHandshake {
    fn surface_closed(&self, id: SurfaceId, host: &dyn EditorHost) {
        if id != self.target {
            // Some other surface; not ours to act on.
            return;
        }

        let mut inner = self.lock();
        let Some(on_complete) = inner.on_complete.take() else {
            debug!("Duplicate close notification for {id:?}, handshake already idle");
            return;
        };

        // The buffer must be read now; the host discards it after this
        // notification returns.
        let text = host.surface_text(id);

        if let Some(subscription) = inner.subscription.take() {
            host.unsubscribe_closed(subscription);
        }

        let result = text.and_then(|raw| {
            let message = normalize_message(&raw);
            debug!("Committing normalized message ({} bytes)", message.len());
            let repo = Repository::open(&self.workdir)?;
            operations::commit_staged(&repo, &message)
        });

        if let Err(ref e) = result {
            error!("Commit failed: {e}");
        }

        drop(inner);
        on_complete(result);
    }
}

/// Strip the comment convention from an edited commit message: drop lines
/// that are empty after trimming or whose trimmed form starts with `#`,
/// keeping the relative order of everything else.
pub fn normalize_message(raw: &str) -> String {
    raw.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect::<Vec<_>>()
        .join("\n")
}
