//! rigctl command interpreter
//!
//! Understands the small subset of the Hamlib `rigctld` text protocol that
//! logging and digital-mode programs use to follow a rig:
//!
//! | Line | Meaning | Reply |
//! |------|---------|-------|
//! | `v` / `V` | identify | device id / version |
//! | `f` | get frequency | `14250000` |
//! | `m` | get mode | `USB 2400` |
//! | `t` | get PTT | `0` / `1` |
//! | `F<hz>` | set frequency | `RPRT 0` / `RPRT -1` |
//! | `M <mode> <width>` | set mode | `RPRT 0` / `RPRT -1` |
//! | `T<0/1>` | set PTT | `RPRT 0` |
//! | `q` or empty | close connection | none |
//!
//! Anything else is answered with `RPRT -1`.

use std::fmt;
use std::sync::Arc;

use pmr_protocol::Mode;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::session::RadioSession;

/// Reply to `v`
pub const DEVICE_ID: &str = "PMR-171";

/// Reply to `V`
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// One parsed rigctl line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    DeviceId,
    Version,
    GetFrequency,
    GetMode,
    GetPtt,
    SetFrequency { hz: u32 },
    SetMode { mode: Mode },
    SetPtt { transmit: bool },
    /// Close the connection without replying
    Quit,
    /// Unrecognized or malformed line
    Invalid(String),
}

impl Request {
    /// Parse one line; surrounding whitespace is ignored
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        match line {
            "" | "q" => return Request::Quit,
            "v" => return Request::DeviceId,
            "V" => return Request::Version,
            "f" => return Request::GetFrequency,
            "m" => return Request::GetMode,
            "t" => return Request::GetPtt,
            _ => {}
        }

        if let Some(rest) = line.strip_prefix('F') {
            return match rest.trim().parse::<u32>() {
                Ok(hz) => Request::SetFrequency { hz },
                Err(_) => Request::Invalid(line.to_string()),
            };
        }

        if line.starts_with('M') {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            return match tokens.as_slice() {
                [_, mode, _width] => Request::SetMode {
                    mode: Mode::from_name(mode),
                },
                _ => Request::Invalid(line.to_string()),
            };
        }

        if let Some(rest) = line.strip_prefix('T') {
            return Request::SetPtt {
                transmit: rest.trim() == "1",
            };
        }

        Request::Invalid(line.to_string())
    }
}

/// Reply line sent back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A queried value
    Value(String),
    /// `RPRT <code>` status report
    Report(i32),
}

impl Reply {
    /// Successful set
    pub const OK: Reply = Reply::Report(0);
    /// Parse failure or unknown command
    pub const FAILED: Reply = Reply::Report(-1);
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(value) => writeln!(f, "{}", value),
            Reply::Report(code) => writeln!(f, "RPRT {}", code),
        }
    }
}

/// Executes rigctl requests against a shared radio session
pub struct Interpreter<T> {
    session: Arc<RadioSession<T>>,
}

// Derive would require `T: Clone`
impl<T> Clone for Interpreter<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<T> Interpreter<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(session: Arc<RadioSession<T>>) -> Self {
        Self { session }
    }

    /// Session commands are executed against
    pub fn session(&self) -> &Arc<RadioSession<T>> {
        &self.session
    }

    /// Parse and execute one line
    ///
    /// Returns `None` when the connection should be closed.
    pub async fn handle_line(&self, line: &str) -> Option<Reply> {
        let request = Request::parse(line);
        debug!("rigctl request: {:?}", request);
        self.execute(request).await
    }

    /// Execute a parsed request
    pub async fn execute(&self, request: Request) -> Option<Reply> {
        let reply = match request {
            Request::Quit => return None,
            Request::DeviceId => Reply::Value(DEVICE_ID.to_string()),
            Request::Version => Reply::Value(PROTOCOL_VERSION.to_string()),
            Request::GetFrequency => Reply::Value(self.session.get_frequency().await.to_string()),
            Request::GetMode => Reply::Value(self.session.get_mode().await.to_string()),
            Request::GetPtt => {
                let ptt = self.session.ptt().await;
                Reply::Value(if ptt { "1" } else { "0" }.to_string())
            }
            Request::SetFrequency { hz } => {
                self.session.set_frequency(hz).await;
                Reply::OK
            }
            Request::SetMode { mode } => {
                self.session.set_mode(mode).await;
                Reply::OK
            }
            Request::SetPtt { transmit } => {
                self.session.set_ptt(transmit).await;
                Reply::OK
            }
            Request::Invalid(line) => {
                debug!("Rejecting rigctl line {:?}", line);
                Reply::FAILED
            }
        };
        Some(reply)
    }
}
