use crate::store::StateSnapshot;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Messages the UI session sends to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum UiToHost {
    /// Forward a UI-side log line into the host's structured log.
    Log(String),
    /// The UI finished mounting and can accept restored state and deep links.
    Ready,
    /// Start a cut. `duration` is the selected span, not the file length.
    CutVideo {
        file_path: PathBuf,
        start_time: f64,
        duration: f64,
    },
    /// Persist the current session snapshot.
    SaveState(StateSnapshot),
}

/// Messages the host sends to the UI session.
#[derive(Debug, Clone, PartialEq)]
pub enum HostToUi {
    CutProgress(f64),
    CutDone(PathBuf),
    CutError(String),
    RestoreState(StateSnapshot),
    OpenFileFromLink(PathBuf),
}

/// One side of the UI/host pipe.
#[derive(Debug)]
pub struct Endpoint<Out, In> {
    pub tx: mpsc::UnboundedSender<Out>,
    pub rx: mpsc::UnboundedReceiver<In>,
}

impl<Out, In> Endpoint<Out, In> {
    /// Send, ignoring a closed peer. Either side may outlive the other during
    /// shutdown and neither treats that as an error.
    pub fn send(&self, msg: Out) {
        let _ = self.tx.send(msg);
    }
}

pub type UiEndpoint = Endpoint<UiToHost, HostToUi>;
pub type HostEndpoint = Endpoint<HostToUi, UiToHost>;

/// Build the connected pair of endpoints.
pub fn pair() -> (UiEndpoint, HostEndpoint) {
    let (ui_tx, host_rx) = mpsc::unbounded_channel();
    let (host_tx, ui_rx) = mpsc::unbounded_channel();
    (
        Endpoint {
            tx: ui_tx,
            rx: ui_rx,
        },
        Endpoint {
            tx: host_tx,
            rx: host_rx,
        },
    )
}
