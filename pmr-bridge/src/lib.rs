//! rigctl bridge for the PMR-171
//!
//! Exposes a PMR-171 on a serial port as a Hamlib `rigctld`-compatible TCP
//! service, so logging and digital-mode software can read and set its
//! frequency, mode and PTT.
//!
//! - [`RadioSession`]: serialized access to the radio over any async link
//! - [`Interpreter`]: the rigctl text command subset
//! - [`RigctlServer`]: TCP listener with one task per client
//! - [`Settings`] / [`Cli`]: configuration file and command line
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pmr_bridge::{RadioSession, RigctlServer, DEFAULT_QUERY_TIMEOUT};
//! use pmr_sim::{spawn_virtual_radio, VirtualRadio};
//!
//! # async fn run() -> std::io::Result<()> {
//! let (link, _radio) = spawn_virtual_radio(VirtualRadio::new("PMR-171"));
//! let session = Arc::new(RadioSession::new("sim", link, DEFAULT_QUERY_TIMEOUT));
//!
//! let server = RigctlServer::bind("127.0.0.1:4532", session).await?;
//! server.run().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod rigctl;
pub mod server;
pub mod session;
pub mod settings;

pub use cli::Cli;
pub use error::{BridgeError, SessionError};
pub use rigctl::{Interpreter, Reply, Request};
pub use server::{serve_connection, RigctlServer, DEFAULT_PORT, MAX_LINE_LEN};
pub use session::{ModeReport, RadioSession, DEFAULT_QUERY_TIMEOUT};
pub use settings::Settings;
