//! Radio session: exclusive, serialized access to the PMR-171 serial link
//!
//! Every operation encodes a frame, then takes the link guard for the
//! write and, for queries, the read that follows it. The guard is a
//! `tokio::sync::Mutex`, so it is released on every exit path, including
//! errors and cancellation of the calling task.
//!
//! Setters are fire-and-forget. Queries never fail: any transport or
//! framing problem is logged and replaced by a default value so the rigctl
//! client always gets a parseable reply.

use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;

use pmr_protocol::frame::{frame_len, MAX_FRAME_LEN, SYNC};
use pmr_protocol::{status, EncodeCommand, Mode, PmrCommand};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::error::SessionError;

/// Default time to wait for a query-status response
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Most bytes read back for one query until a frame header says otherwise
pub const MAX_RESPONSE_LEN: usize = 64;

/// Most stale bytes discarded before one query
const MAX_DRAIN_LEN: usize = 4 * MAX_FRAME_LEN;

/// Passband reported alongside the mode, fixed for rigctl compatibility
pub const PASSBAND_HZ: u32 = 2400;

/// Mode as reported to rigctl clients, e.g. `USB 2400`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeReport {
    /// Operating mode
    pub mode: Mode,
    /// Passband width in Hz
    pub passband_hz: u32,
}

impl ModeReport {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            passband_hz: PASSBAND_HZ,
        }
    }
}

impl fmt::Display for ModeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mode, self.passband_hz)
    }
}

/// State guarded by the link mutex
struct Link<T> {
    io: T,
    /// Last commanded PTT state, not confirmed by the radio
    ptt: bool,
}

/// Session with a single PMR-171
///
/// Generic over the I/O type so tests and the simulator can substitute a
/// `DuplexStream` for the serial port. Share it between connections with
/// an `Arc`.
pub struct RadioSession<T> {
    name: String,
    link: Mutex<Link<T>>,
    query_timeout: Duration,
}

impl RadioSession<SerialStream> {
    /// Open the serial device the radio is attached to
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        query_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let stream = tokio_serial::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;

        info!("Opened {} at {} baud", port_name, baud_rate);
        Ok(Self::new(port_name, stream, query_timeout))
    }
}

impl<T> RadioSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a session over an already open link
    pub fn new(name: impl Into<String>, io: T, query_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            link: Mutex::new(Link { io, ptt: false }),
            query_timeout,
        }
    }

    /// Name of the underlying link (port name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set both VFOs to `hz`
    pub async fn set_frequency(&self, hz: u32) {
        self.send(PmrCommand::SetFrequency { hz }).await;
    }

    /// Read the VFO-A frequency, or 0 if the radio did not give a usable answer
    pub async fn get_frequency(&self) -> u32 {
        let result = self
            .query_status()
            .await
            .and_then(|raw| status::frequency_from_response(&raw).map_err(SessionError::from));

        match result {
            Ok(hz) => hz,
            Err(e) => {
                warn!("Frequency query on {} failed, reporting 0: {}", self.name, e);
                0
            }
        }
    }

    /// Set the operating mode
    pub async fn set_mode(&self, mode: Mode) {
        self.send(PmrCommand::SetMode { mode }).await;
    }

    /// Read the operating mode, or USB if the radio did not give a usable answer
    pub async fn get_mode(&self) -> ModeReport {
        let result = self
            .query_status()
            .await
            .and_then(|raw| status::mode_from_response(&raw).map_err(SessionError::from));

        match result {
            Ok(mode) => ModeReport::new(mode),
            Err(e) => {
                warn!("Mode query on {} failed, reporting USB: {}", self.name, e);
                ModeReport::new(Mode::Usb)
            }
        }
    }

    /// Key (`true`) or unkey the transmitter
    ///
    /// The cached PTT state is updated even if the write fails.
    pub async fn set_ptt(&self, transmit: bool) {
        let frame = PmrCommand::SetPtt { transmit }.encode();

        let mut link = self.link.lock().await;
        if let Err(e) = write_frame(&mut link.io, &frame).await {
            warn!("Write to {} failed: {}", self.name, e);
        }
        link.ptt = transmit;
    }

    /// Last commanded PTT state
    pub async fn ptt(&self) -> bool {
        self.link.lock().await.ptt
    }

    /// Write a setter frame; failures are logged, not returned
    async fn send(&self, cmd: PmrCommand) {
        let frame = cmd.encode();

        let mut link = self.link.lock().await;
        if let Err(e) = write_frame(&mut link.io, &frame).await {
            warn!("Write of {:?} to {} failed: {}", cmd, self.name, e);
        }
    }

    /// Send query-status and collect the raw response
    async fn query_status(&self) -> Result<Vec<u8>, SessionError> {
        let frame = PmrCommand::QueryStatus.encode();

        let mut link = self.link.lock().await;
        drain_stale(&mut link.io, &self.name).await;
        write_frame(&mut link.io, &frame).await?;
        let response = read_response(&mut link.io, self.query_timeout).await?;
        debug!("RX {}: {:02X?}", self.name, response);
        Ok(response)
    }
}

async fn write_frame<T>(io: &mut T, frame: &[u8]) -> std::io::Result<()>
where
    T: AsyncWrite + Unpin,
{
    debug!("TX: {:02X?}", frame);
    io.write_all(frame).await?;
    io.flush().await
}

/// Discard bytes already buffered on the link, such as a reply that
/// arrived after its query timed out
async fn drain_stale<T>(io: &mut T, name: &str)
where
    T: AsyncRead + Unpin,
{
    let mut chunk = [0u8; MAX_FRAME_LEN];
    let mut drained = 0;

    while drained < MAX_DRAIN_LEN {
        // A zero timeout still polls the read once
        match tokio::time::timeout(Duration::ZERO, io.read(&mut chunk)).await {
            Ok(Ok(n)) if n > 0 => {
                debug!("Discarding {} stale byte(s) from {}: {:02X?}", n, name, &chunk[..n]);
                drained += n;
            }
            _ => break,
        }
    }
}

/// Read until a whole frame, EOF or the deadline
///
/// Before a frame header is seen at most [`MAX_RESPONSE_LEN`] bytes are
/// read; after it, up to the length the header declares.
async fn read_response<T>(io: &mut T, timeout: Duration) -> Result<Vec<u8>, SessionError>
where
    T: AsyncRead + Unpin,
{
    let deadline = Instant::now() + timeout;
    let mut response = Vec::with_capacity(MAX_RESPONSE_LEN);
    let mut chunk = [0u8; MAX_FRAME_LEN];

    while !response_complete(&response) {
        let limit = read_limit(&response);
        if response.len() >= limit {
            break;
        }
        let want = limit - response.len();
        match tokio::time::timeout_at(deadline, io.read(&mut chunk[..want])).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => response.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => break,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => break,
        }
    }

    if response.is_empty() {
        return Err(SessionError::NoResponse);
    }
    Ok(response)
}

fn read_limit(buf: &[u8]) -> usize {
    frame_len(buf)
        .unwrap_or(MAX_RESPONSE_LEN)
        .min(MAX_FRAME_LEN)
}

/// Whether waiting for more bytes cannot change the outcome
fn response_complete(buf: &[u8]) -> bool {
    if buf.len() >= SYNC.len() && !buf.starts_with(&SYNC) {
        return true;
    }
    frame_len(buf).is_some_and(|len| buf.len() >= len)
}
