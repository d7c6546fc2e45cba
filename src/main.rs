use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use gitpane::config::{Args, Config};
use gitpane::git::operations;
use gitpane::host::{EditorHost, ObserverRegistry, SubscriptionId, SurfaceId, SurfaceObserver};
use gitpane::panel::PanelPage;
use gitpane::plugin::GitPlugin;
use gitpane::logging;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};

include!(concat!(env!("OUT_DIR"), "/git_sha.rs"));

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("gitpane version 0.1.0 (git: {GIT_SHA})");
        return Ok(());
    }

    let config = Config::load()?;
    let final_config = config.merge_with_args(&args);

    logging::init_logging(final_config.debug.unwrap_or(false))?;
    color_eyre::install()?;

    let file = args
        .file
        .clone()
        .ok_or_else(|| eyre!("expected a file argument (the active file)"))?;
    info!("Starting gitpane for {file:?}");

    let mut plugin = GitPlugin::new();
    plugin.active_path_changed(&file);

    if args.init {
        if plugin.panel.page() == Some(PanelPage::Init) {
            plugin.init_repository()?;
            info!("Initialized repository");
        } else {
            debug!("--init ignored, panel is not on the init page");
        }
    }

    if !args.track.is_empty() {
        select_paths(&mut plugin, &args.track)?;
        plugin.track_selected()?;
    }

    if args.stage_all {
        plugin.stage_all()?;
    } else if !args.stage.is_empty() {
        select_paths(&mut plugin, &args.stage)?;
        plugin.stage_selected()?;
    }

    if !args.ignore.is_empty() {
        select_paths(&mut plugin, &args.ignore)?;
        plugin.ignore_selected()?;
    }

    if args.commit {
        run_commit(&mut plugin, &final_config)?;
        plugin.refresh();
    }

    print!("{}", plugin.panel.render());
    Ok(())
}

/// Tick the panel rows named on the command line, converting absolute
/// arguments to repository-relative form first.
fn select_paths(plugin: &mut GitPlugin, paths: &[PathBuf]) -> Result<()> {
    let repo = plugin
        .repository()
        .ok_or_else(|| eyre!("no repository for the current folder"))?;
    let relative: Vec<PathBuf> = paths
        .iter()
        .map(|p| operations::to_repo_relative_path(repo, p))
        .collect();

    for path in relative {
        if !plugin.panel.view.select_path(&path) {
            return Err(eyre!("{} is not listed in the panel", path.display()));
        }
    }
    Ok(())
}

/// Drive the commit handshake through the `$EDITOR`-backed host and report
/// the outcome.
fn run_commit(plugin: &mut GitPlugin, config: &Config) -> Result<()> {
    let host = ShellEditorHost::new(config.editor_command());
    let (tx, rx) = mpsc::channel();

    plugin.begin_commit(
        &host,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    )?;

    host.run_pending()?;

    match rx.recv() {
        Ok(Ok(oid)) => {
            println!("created commit {oid}");
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(eyre!("commit handshake ended without a result")),
    }
}

struct SurfaceState {
    path: PathBuf,
    buffer: String,
    closed: bool,
}

/// `EditorHost` for the CLI shell: an editing surface is the configured
/// editor run on the staging file, and the surface closes when the editor
/// exits. The file content at exit becomes the surface buffer, captured
/// before subscribers are notified.
struct ShellEditorHost {
    editor: String,
    next_surface: AtomicU64,
    surfaces: Mutex<HashMap<SurfaceId, SurfaceState>>,
    registry: ObserverRegistry,
}

impl ShellEditorHost {
    fn new(editor: String) -> Self {
        Self {
            editor,
            next_surface: AtomicU64::new(0),
            surfaces: Mutex::new(HashMap::new()),
            registry: ObserverRegistry::new(),
        }
    }

    fn surfaces(&self) -> MutexGuard<'_, HashMap<SurfaceId, SurfaceState>> {
        self.surfaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run the editor for every surface opened so far, dispatching the
    /// close notification as each editor exits.
    fn run_pending(&self) -> Result<()> {
        let pending: Vec<(SurfaceId, PathBuf)> = self
            .surfaces()
            .iter()
            .filter(|(_, s)| !s.closed)
            .map(|(id, s)| (*id, s.path.clone()))
            .collect();

        for (id, path) in pending {
            debug!("Opening editor for {path:?}");
            let command = format!("{} '{}'", self.editor, path.display());
            let status = Command::new("sh").args(["-c", &command]).status()?;
            if !status.success() {
                return Err(eyre!("editor exited with {status}"));
            }

            let buffer = std::fs::read_to_string(&path).unwrap_or_default();
            {
                let mut surfaces = self.surfaces();
                if let Some(surface) = surfaces.get_mut(&id) {
                    surface.buffer = buffer;
                    surface.closed = true;
                }
            }

            self.registry.notify_closed(id, self);

            // The buffer is only queryable during the notification.
            self.surfaces().remove(&id);
        }
        Ok(())
    }
}

impl EditorHost for ShellEditorHost {
    fn open_surface(&self, path: &Path) -> Result<SurfaceId> {
        let id = SurfaceId(self.next_surface.fetch_add(1, Ordering::Relaxed));
        self.surfaces().insert(
            id,
            SurfaceState {
                path: path.to_path_buf(),
                buffer: String::new(),
                closed: false,
            },
        );
        Ok(id)
    }

    fn surface_text(&self, id: SurfaceId) -> Result<String> {
        self.surfaces()
            .get(&id)
            .map(|s| s.buffer.clone())
            .ok_or_else(|| eyre!("unknown surface {id:?}"))
    }

    fn subscribe_closed(&self, observer: Arc<dyn SurfaceObserver>) -> SubscriptionId {
        self.registry.subscribe(observer)
    }

    fn unsubscribe_closed(&self, subscription: SubscriptionId) {
        self.registry.unsubscribe(subscription)
    }
}
