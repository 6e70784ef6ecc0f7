pub mod bridge;
pub mod channel;
pub mod deeplink;
pub mod instance;
pub mod pending;
pub mod session;
pub mod store;
pub mod transport;

use anyhow::Context;
use channel::{HostEndpoint, HostToUi, UiEndpoint, UiToHost};
use instance::Instance;
use pending::PendingDeepLink;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use store::StateStore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use veelo_cut::{CutProgress, CutRequest};

const INSTANCE_PORT_FILE: &str = "instance.port";

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Host side of the typed channel: owns persistence, deep-link routing, and
/// cut execution. The receive half of the channel stays with the caller's
/// event loop; the host only ever replies through `to_ui`.
pub struct Host {
    store: StateStore,
    to_ui: UnboundedSender<HostToUi>,
    pending: PendingDeepLink,
    ui_ready: bool,
}

impl Host {
    pub fn new(store: StateStore, to_ui: UnboundedSender<HostToUi>) -> Self {
        Self {
            store,
            to_ui,
            pending: PendingDeepLink::default(),
            ui_ready: false,
        }
    }

    pub fn handle_ui_message(&mut self, msg: UiToHost) {
        match msg {
            UiToHost::Log(line) => tracing::info!(target: "veelo::ui", "{line}"),
            UiToHost::Ready => self.on_ui_ready(),
            UiToHost::SaveState(snapshot) => self.store.save(&snapshot),
            UiToHost::CutVideo {
                file_path,
                start_time,
                duration,
            } => self.start_cut(file_path, start_time, duration),
        }
    }

    /// Route a raw deep-link URI. Malformed or dangling links are logged and
    /// dropped; valid ones go to the UI now or wait in the pending slot.
    pub fn handle_deep_link(&mut self, uri: &str) {
        match deeplink::parse(uri) {
            Ok(path) => {
                if self.ui_ready {
                    self.send(HostToUi::OpenFileFromLink(path));
                } else {
                    self.pending.set(path);
                }
            }
            Err(e) => tracing::warn!(uri, error = %e, "dropping deep link"),
        }
    }

    fn on_ui_ready(&mut self) {
        self.ui_ready = true;
        let snapshot = self.store.load().unwrap_or_default();
        self.send(HostToUi::RestoreState(snapshot));
        if let Some(path) = self.pending.take() {
            self.send(HostToUi::OpenFileFromLink(path));
        }
    }

    fn start_cut(&self, file_path: PathBuf, start_time: f64, duration: f64) {
        let request = CutRequest {
            input: file_path,
            start_seconds: start_time,
            duration_seconds: duration,
            output: None,
        };
        let to_ui = self.to_ui.clone();
        tokio::spawn(async move {
            let plan = match veelo_cut::cut::compile(&request) {
                Ok(plan) => plan,
                Err(e) => {
                    let _ = to_ui.send(HostToUi::CutError(e.to_string()));
                    return;
                }
            };

            let (progress_tx, mut progress_rx) = watch::channel(CutProgress::default());
            let forwarder = {
                let to_ui = to_ui.clone();
                tokio::spawn(async move {
                    while progress_rx.changed().await.is_ok() {
                        let percent = progress_rx.borrow().percent;
                        let _ = to_ui.send(HostToUi::CutProgress(percent));
                    }
                })
            };

            let result = veelo_cut::cut::execute(&plan, progress_tx).await;
            // All progress is flushed before the terminal message.
            let _ = forwarder.await;
            match result {
                Ok(output) => {
                    let _ = to_ui.send(HostToUi::CutDone(output));
                }
                Err(e) => {
                    let _ = to_ui.send(HostToUi::CutError(e.to_string()));
                }
            }
        });
    }

    fn send(&self, msg: HostToUi) {
        let _ = self.to_ui.send(msg);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Single-instance handshake, then either hand the command line to the
/// running primary or become the primary and run the pipeline.
pub async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let port_file = instance_port_file().context("no config directory available")?;

    match instance::acquire(port_file).await? {
        Instance::Secondary(secondary) => {
            if let Some(uri) = deeplink::find_in_args(args.iter().map(String::as_str)) {
                secondary.forward(uri).await?;
            }
            tracing::info!("handed off to running instance");
            Ok(())
        }
        Instance::Primary(primary) => {
            let (link_tx, link_rx) = tokio::sync::mpsc::unbounded_channel();
            primary.listen(link_tx);

            let store = StateStore::at_default_location().context("no config directory")?;
            let startup_link = deeplink::find_in_args(args.iter().map(String::as_str));
            run_primary(store, link_rx, startup_link).await
        }
    }
}

fn instance_port_file() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("veelo");
    path.push(INSTANCE_PORT_FILE);
    Some(path)
}

async fn run_primary(
    store: StateStore,
    mut link_rx: tokio::sync::mpsc::UnboundedReceiver<String>,
    startup_link: Option<&str>,
) -> anyhow::Result<()> {
    let media_port = bridge::start_media_server();
    tracing::debug!(media_port, "media bridge ready");

    let (ui, host_endpoint) = channel::pair();
    let HostEndpoint {
        tx: to_ui,
        rx: mut from_ui,
    } = host_endpoint;
    let mut host = Host::new(store, to_ui);

    if let Some(uri) = startup_link {
        host.handle_deep_link(uri);
    }

    let session_task = tokio::spawn(run_session(ui));

    loop {
        tokio::select! {
            msg = from_ui.recv() => match msg {
                Some(msg) => host.handle_ui_message(msg),
                None => break,
            },
            uri = link_rx.recv() => match uri {
                Some(uri) => host.handle_deep_link(&uri),
                None => break,
            },
        }
    }

    session_task.abort();
    Ok(())
}

/// Session-side duration probe. ffprobe is a blocking subprocess call, so it
/// runs in a blocking section instead of stalling the event loop.
fn probe_duration(path: &Path) -> Result<f64, String> {
    tokio::task::block_in_place(|| veelo_cut::probe::duration_seconds(path))
        .map_err(|e| e.to_string())
}

/// Drive the UI session headlessly: apply host events as they arrive and run
/// the time-based housekeeping tick.
async fn run_session(ui: UiEndpoint) {
    let UiEndpoint {
        tx: to_host,
        rx: mut from_host,
    } = ui;
    let mut session =
        session::Session::new(transport::DirectTransport::new(), probe_duration, to_host);
    session.announce_ready();

    let mut tick = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            event = from_host.recv() => match event {
                Some(event) => {
                    session.handle_host_event(event, Instant::now());
                    for alert in session.take_alerts() {
                        tracing::warn!(alert = %alert, "session alert");
                    }
                    if let Some(video) = session.video() {
                        tracing::debug!(url = %bridge::media_url(&video.path), "media locator");
                    }
                }
                None => break,
            },
            _ = tick.tick() => session.tick(Instant::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::StateSnapshot;
    use tempfile::TempDir;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn host_with_store(dir: &TempDir) -> (Host, UnboundedReceiver<HostToUi>, StateStore) {
        let store = StateStore::new(dir.path().join("app-state.json"));
        let (tx, rx) = mpsc::unbounded_channel();
        (Host::new(store.clone(), tx), rx, store)
    }

    fn drain(rx: &mut UnboundedReceiver<HostToUi>) -> Vec<HostToUi> {
        let mut out = vec![];
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn ready_restores_saved_state() {
        let dir = TempDir::new().unwrap();
        let (mut host, mut rx, store) = host_with_store(&dir);

        let snapshot = StateSnapshot {
            video_file: Some(veelo_core::types::VideoFile::from_path("/m/a.mp4", 9.0)),
            trim_settings: None,
        };
        store.save(&snapshot);

        host.handle_ui_message(UiToHost::Ready);
        assert_eq!(drain(&mut rx), vec![HostToUi::RestoreState(snapshot)]);
    }

    #[tokio::test]
    async fn ready_without_saved_state_restores_empty() {
        let dir = TempDir::new().unwrap();
        let (mut host, mut rx, _store) = host_with_store(&dir);
        host.handle_ui_message(UiToHost::Ready);
        assert_eq!(
            drain(&mut rx),
            vec![HostToUi::RestoreState(StateSnapshot::default())]
        );
    }

    #[tokio::test]
    async fn save_state_persists_snapshot() {
        let dir = TempDir::new().unwrap();
        let (mut host, _rx, store) = host_with_store(&dir);

        let snapshot = StateSnapshot {
            video_file: Some(veelo_core::types::VideoFile::from_path("/m/b.mp4", 4.0)),
            trim_settings: None,
        };
        host.handle_ui_message(UiToHost::SaveState(snapshot.clone()));
        assert_eq!(store.load(), Some(snapshot));
    }

    #[tokio::test]
    async fn deep_link_before_ready_is_queued_and_flushed() {
        let dir = TempDir::new().unwrap();
        let (mut host, mut rx, _store) = host_with_store(&dir);

        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"x").unwrap();
        let uri = format!(
            "veelo://file?path={}",
            bridge::percent_encode(&file.to_string_lossy())
        );

        host.handle_deep_link(&uri);
        assert!(drain(&mut rx).is_empty());

        host.handle_ui_message(UiToHost::Ready);
        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 2);
        assert!(matches!(&msgs[0], HostToUi::RestoreState(_)));
        assert_eq!(msgs[1], HostToUi::OpenFileFromLink(file));
    }

    #[tokio::test]
    async fn deep_link_after_ready_is_sent_directly() {
        let dir = TempDir::new().unwrap();
        let (mut host, mut rx, _store) = host_with_store(&dir);
        host.handle_ui_message(UiToHost::Ready);
        drain(&mut rx);

        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"x").unwrap();
        let uri = format!(
            "veelo://file?path={}",
            bridge::percent_encode(&file.to_string_lossy())
        );
        host.handle_deep_link(&uri);
        assert_eq!(drain(&mut rx), vec![HostToUi::OpenFileFromLink(file)]);
    }

    #[tokio::test]
    async fn invalid_deep_link_is_dropped() {
        let dir = TempDir::new().unwrap();
        let (mut host, mut rx, _store) = host_with_store(&dir);
        host.handle_ui_message(UiToHost::Ready);
        drain(&mut rx);

        host.handle_deep_link("veelo://file?path=/tmp/definitely-missing.mp4");
        host.handle_deep_link("https://not-our-scheme");
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn probe_loader_reports_missing_file() {
        // block_in_place requires the multi-thread runtime the binary uses.
        let err = probe_duration(Path::new("/no/such/clip.mp4")).unwrap_err();
        assert!(err.contains("file not found"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn cut_against_missing_input_reports_error() {
        let dir = TempDir::new().unwrap();
        let (mut host, mut rx, _store) = host_with_store(&dir);

        host.handle_ui_message(UiToHost::CutVideo {
            file_path: dir.path().join("nope.mp4"),
            start_time: 0.0,
            duration: 1.0,
        });

        // The spawned cut always ends in a terminal message; with a missing
        // input that message is an error.
        loop {
            match rx.recv().await.expect("terminal message") {
                HostToUi::CutError(_) => break,
                HostToUi::CutProgress(_) => continue,
                other => panic!("unexpected message: {other:?}"),
            }
        }
    }
}
