//! End-to-end tests for the rigctl bridge
//!
//! A real TCP listener on an ephemeral port serves a session whose serial
//! link is an in-process virtual radio, and clients talk to it over
//! loopback sockets exactly as a logging program would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pmr_bridge::{RadioSession, RigctlServer};
use pmr_protocol::frame::frame_len;
use pmr_protocol::{decode, Mode, PmrCommand};
use pmr_sim::{spawn_virtual_radio, VirtualRadio, VirtualRadioCommand, VirtualRadioHandle};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const QUERY_TIMEOUT: Duration = Duration::from_millis(300);
    pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

    /// Start a bridge in front of a fresh virtual radio
    pub async fn start_bridge() -> (SocketAddr, VirtualRadioHandle) {
        let (link, radio) = spawn_virtual_radio(VirtualRadio::new("Test PMR-171"));
        let session = Arc::new(RadioSession::new("sim", link, QUERY_TIMEOUT));

        let server = RigctlServer::bind("127.0.0.1:0", session).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        (addr, radio)
    }

    /// A connected rigctl client
    pub struct Client {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    impl Client {
        pub async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            let (reader, writer) = stream.into_split();
            Self {
                lines: BufReader::new(reader).lines(),
                writer,
            }
        }

        pub async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{}\n", line).as_bytes())
                .await
                .unwrap();
        }

        /// Next reply line, `None` once the server closed the connection
        pub async fn reply(&mut self) -> Option<String> {
            tokio::time::timeout(REPLY_TIMEOUT, self.lines.next_line())
                .await
                .expect("reply timed out")
                .unwrap()
        }

        /// Send one command and return its reply
        pub async fn command(&mut self, line: &str) -> String {
            self.send(line).await;
            self.reply().await.expect("connection closed")
        }
    }
}

use helpers::*;

// ============================================================================
// Command Grammar
// ============================================================================

#[tokio::test]
async fn test_get_frequency_from_radio() {
    let (addr, _radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("f").await, "14250000");
    assert_eq!(client.command("m").await, "USB 2400");
}

#[tokio::test]
async fn test_set_frequency_reaches_radio() {
    let (addr, radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("F7074000").await, "RPRT 0");
    assert_eq!(client.command("f").await, "7074000");

    let radio = radio.shutdown().await.unwrap();
    assert_eq!(radio.frequency_hz(), 7_074_000);
    assert_eq!(radio.vfo_b_hz(), 7_074_000);
}

#[tokio::test]
async fn test_bad_frequency_sends_no_frame() {
    let (addr, radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("Fabc").await, "RPRT -1");
    assert_eq!(client.command("zzz").await, "RPRT -1");
    // Connection is still usable and the query is the only frame sent
    assert_eq!(client.command("f").await, "14250000");

    let radio = radio.shutdown().await.unwrap();
    assert_eq!(radio.frames_received(), 1);
}

#[tokio::test]
async fn test_set_mode_reaches_radio() {
    let (addr, radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("M LSB 2400").await, "RPRT 0");
    assert_eq!(client.command("m").await, "LSB 2400");
    assert_eq!(client.command("M DIGI").await, "RPRT -1");

    let radio = radio.shutdown().await.unwrap();
    assert_eq!(radio.mode(), Mode::Lsb);
}

#[tokio::test]
async fn test_ptt_cached_and_sent() {
    let (addr, radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("t").await, "0");
    assert_eq!(client.command("T1").await, "RPRT 0");
    assert_eq!(client.command("t").await, "1");
    // Round trip through the radio so the PTT frame is known to be processed
    assert_eq!(client.command("f").await, "14250000");

    let radio = radio.shutdown().await.unwrap();
    assert!(radio.ptt());
}

#[tokio::test]
async fn test_ptt_cache_shared_between_clients() {
    let (addr, _radio) = start_bridge().await;
    let mut first = Client::connect(addr).await;
    let mut second = Client::connect(addr).await;

    assert_eq!(first.command("T1").await, "RPRT 0");
    assert_eq!(second.command("t").await, "1");
}

#[tokio::test]
async fn test_identify() {
    let (addr, _radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("v").await, "PMR-171");
    assert_eq!(client.command("V").await, "1.0.0");
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let (addr, _radio) = start_bridge().await;

    let mut client = Client::connect(addr).await;
    client.send("q").await;
    assert_eq!(client.reply().await, None);

    let mut client = Client::connect(addr).await;
    client.send("").await;
    assert_eq!(client.reply().await, None);

    // The listener keeps serving new clients
    let mut client = Client::connect(addr).await;
    assert_eq!(client.command("v").await, "PMR-171");
}

// ============================================================================
// Degradation
// ============================================================================

#[tokio::test]
async fn test_silent_radio_degrades_to_defaults() {
    let (addr, radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command("M AM 2400").await, "RPRT 0");
    assert!(radio.send(VirtualRadioCommand::SetMuted(true)).await);

    assert_eq!(client.command("f").await, "0");
    assert_eq!(client.command("m").await, "USB 2400");

    assert!(radio.send(VirtualRadioCommand::SetMuted(false)).await);
    assert_eq!(client.command("m").await, "AM 2400");
}

#[tokio::test]
async fn test_front_panel_changes_visible() {
    let (addr, radio) = start_bridge().await;
    let mut client = Client::connect(addr).await;

    // Queued commands are applied before the next frame from the bridge
    assert!(radio.send(VirtualRadioCommand::SetFrequency(145_500_000)).await);
    assert!(radio.send(VirtualRadioCommand::SetMode(Mode::Nfm)).await);

    assert_eq!(client.command("f").await, "145500000");
    assert_eq!(client.command("m").await, "NFM 2400");
}

// ============================================================================
// Mutual Exclusion
// ============================================================================

#[tokio::test]
async fn test_concurrent_clients_serialized() {
    const CLIENTS: u32 = 8;
    const ROUNDS: u32 = 10;

    let (addr, radio) = start_bridge().await;

    let mut tasks = Vec::new();
    for id in 0..CLIENTS {
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await;
            for round in 0..ROUNDS {
                let hz = 7_000_000 + id * 1_000 + round;
                assert_eq!(client.command(&format!("F{}", hz)).await, "RPRT 0");

                let reply: u32 = client.command("f").await.parse().unwrap();
                assert!((7_000_000..7_000_000 + CLIENTS * 1_000).contains(&reply));

                assert_eq!(client.command("m").await, "USB 2400");
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Every frame arrived intact: one set and two queries per round
    let radio = radio.shutdown().await.unwrap();
    assert_eq!(radio.frames_received(), u64::from(CLIENTS * ROUNDS * 3));
}

#[tokio::test]
async fn test_concurrent_writes_not_interleaved() {
    const WRITERS: u32 = 16;

    let (host, mut device) = tokio::io::duplex(64 * 1024);
    let session = Arc::new(RadioSession::new("duplex", host, QUERY_TIMEOUT));

    let mut tasks = Vec::new();
    for i in 0..WRITERS {
        let session = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                session.set_frequency(1_000_000 + i).await;
            } else {
                session.set_ptt(i % 4 == 1).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    drop(session);

    let mut wire = Vec::new();
    device.read_to_end(&mut wire).await.unwrap();

    // Walk the byte stream frame by frame; any split frame breaks the walk
    let mut frames = Vec::new();
    let mut rest = wire.as_slice();
    while !rest.is_empty() {
        let len = frame_len(rest).expect("frame boundary");
        let frame = decode(&rest[..len]).unwrap();
        frames.push(PmrCommand::from_frame(&frame).unwrap());
        rest = &rest[len..];
    }

    assert_eq!(frames.len(), WRITERS as usize);
    let sets = frames
        .iter()
        .filter(|f| matches!(f, PmrCommand::SetFrequency { .. }))
        .count();
    assert_eq!(sets, (WRITERS / 2) as usize);
}
