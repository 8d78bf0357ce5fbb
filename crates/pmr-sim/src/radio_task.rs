//! Virtual radio actor task
//!
//! This module provides a pure async task that owns a VirtualRadio and
//! serves it over an async stream. The task uses a select! loop to:
//! - Handle control commands (front-panel changes, shutdown) from a channel
//! - Read frames from the connection stream and answer status queries
//! - Emit state change events via a broadcast channel

use std::io;

use pmr_protocol::{FrameCodec, Mode, ProtocolCodec};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::VirtualRadio;

/// Commands that can be sent to a virtual radio actor
#[derive(Debug, Clone)]
pub enum VirtualRadioCommand {
    /// Tune both VFOs, as if from the front panel
    SetFrequency(u32),
    /// Change mode, as if from the front panel
    SetMode(Mode),
    /// Stop (or resume) answering status queries
    SetMuted(bool),
    /// Shutdown the virtual radio actor
    Shutdown,
}

/// State event emitted when virtual radio state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRadioStateEvent {
    /// Current VFO-A frequency in Hz
    pub frequency_hz: u32,
    /// Current operating mode
    pub mode: Mode,
    /// Current PTT state
    pub ptt: bool,
}

impl VirtualRadioStateEvent {
    fn of(radio: &VirtualRadio) -> Self {
        Self {
            frequency_hz: radio.frequency_hz(),
            mode: radio.mode(),
            ptt: radio.ptt(),
        }
    }
}

/// Run the virtual radio actor task
///
/// Processes frames read from `stream` until it closes, a shutdown command
/// arrives or the command channel is dropped. Returns the radio so callers
/// can inspect its final state.
pub async fn run_virtual_radio_task<S>(
    mut stream: S,
    mut radio: VirtualRadio,
    mut cmd_rx: mpsc::Receiver<VirtualRadioCommand>,
    state_tx: broadcast::Sender<VirtualRadioStateEvent>,
) -> io::Result<VirtualRadio>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut codec = FrameCodec::new();
    let mut buf = [0u8; 256];
    let mut last_state = VirtualRadioStateEvent::of(&radio);

    info!("Starting virtual radio task for {}", radio.id());

    // Emit initial state
    let _ = state_tx.send(last_state.clone());

    loop {
        // Control commands win over frames so front-panel changes queued
        // before a query are visible in its reply
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(VirtualRadioCommand::SetFrequency(hz)) => radio.set_frequency(hz),
                    Some(VirtualRadioCommand::SetMode(mode)) => radio.set_mode(mode),
                    Some(VirtualRadioCommand::SetMuted(muted)) => {
                        info!("Virtual radio {} muted: {}", radio.id(), muted);
                        radio.set_muted(muted);
                    }
                    Some(VirtualRadioCommand::Shutdown) => {
                        info!("Shutdown requested for virtual radio {}", radio.id());
                        break;
                    }
                    None => {
                        debug!("Command channel closed for virtual radio {}", radio.id());
                        break;
                    }
                }
            }

            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("Virtual radio stream closed for {}", radio.id());
                        break;
                    }
                    Ok(n) => {
                        let data = &buf[..n];
                        debug!("Virtual radio {} received {} bytes: {:02X?}", radio.id(), n, data);

                        codec.push_bytes(data);
                        while let Some(frame) = codec.next_frame() {
                            if let Some(reply) = radio.process_frame(&frame) {
                                debug!("Virtual radio {} replying: {:02X?}", radio.id(), reply);
                                stream.write_all(&reply).await?;
                                stream.flush().await?;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Virtual radio {} stream error: {}", radio.id(), e);
                        return Err(e);
                    }
                }
            }
        }

        let state = VirtualRadioStateEvent::of(&radio);
        if state != last_state {
            debug!("Virtual radio {} state changed: {}", radio.id(), radio.state_summary());
            let _ = state_tx.send(state.clone());
            last_state = state;
        }
    }

    info!("Virtual radio task ended for {}", radio.id());
    Ok(radio)
}

/// Handle to a virtual radio running on its own task
pub struct VirtualRadioHandle {
    cmd_tx: mpsc::Sender<VirtualRadioCommand>,
    state_tx: broadcast::Sender<VirtualRadioStateEvent>,
    task: JoinHandle<io::Result<VirtualRadio>>,
}

impl VirtualRadioHandle {
    /// Send a control command to the radio task
    pub async fn send(&self, cmd: VirtualRadioCommand) -> bool {
        self.cmd_tx.send(cmd).await.is_ok()
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<VirtualRadioStateEvent> {
        self.state_tx.subscribe()
    }

    /// Stop the task and return the radio's final state
    pub async fn shutdown(self) -> io::Result<VirtualRadio> {
        let _ = self.cmd_tx.send(VirtualRadioCommand::Shutdown).await;
        self.task.await.map_err(io::Error::other)?
    }
}

/// Spawn `radio` on a task behind an in-memory duplex link
///
/// Returns the host side of the link, ready to hand to anything that
/// expects a serial stream.
pub fn spawn_virtual_radio(radio: VirtualRadio) -> (DuplexStream, VirtualRadioHandle) {
    let (host_side, radio_side) = tokio::io::duplex(1024);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (state_tx, _) = broadcast::channel(32);

    let task = tokio::spawn(run_virtual_radio_task(
        radio_side,
        radio,
        cmd_rx,
        state_tx.clone(),
    ));

    (
        host_side,
        VirtualRadioHandle {
            cmd_tx,
            state_tx,
            task,
        },
    )
}
