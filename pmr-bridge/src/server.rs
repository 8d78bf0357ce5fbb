//! rigctl TCP server
//!
//! One task per accepted connection. Each task reads newline-terminated
//! commands, hands them to an [`Interpreter`] and writes back the reply
//! before reading the next line, so commands from one client are strictly
//! ordered. Errors on one connection end only that connection.
//!
//! Lines longer than [`MAX_LINE_LEN`] are discarded up to their newline
//! and answered with `RPRT -1`, so a client never grows the read buffer
//! past that bound.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::rigctl::{Interpreter, Reply};
use crate::session::RadioSession;

/// Conventional rigctld port
pub const DEFAULT_PORT: u16 = 4532;

/// Longest command line accepted, including the newline
pub const MAX_LINE_LEN: usize = 128;

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP listener serving rigctl clients against one radio session
pub struct RigctlServer<T> {
    listener: TcpListener,
    interpreter: Interpreter<T>,
}

impl<T> RigctlServer<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Bind the listener
    pub async fn bind<A: ToSocketAddrs>(addr: A, session: Arc<RadioSession<T>>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            interpreter: Interpreter::new(session),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!("rigctl server listening on {}", addr),
            Err(e) => warn!("rigctl server listening on unknown address: {}", e),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Client connected: {}", peer);
                    let interpreter = self.interpreter.clone();
                    tokio::spawn(async move {
                        match serve_connection(stream, interpreter).await {
                            Ok(()) => info!("Client disconnected: {}", peer),
                            Err(e) => warn!("Client {} error: {}", peer, e),
                        }
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Run the command loop for one client until it quits or disconnects
pub async fn serve_connection<S, T>(stream: S, interpreter: Interpreter<T>) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(MAX_LINE_LEN);

    loop {
        line.clear();
        let n = (&mut reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            break;
        }

        let reply = if n == MAX_LINE_LEN && !line.ends_with(b"\n") {
            warn!("Discarding rigctl line longer than {} bytes", MAX_LINE_LEN);
            skip_line(&mut reader).await?;
            Reply::FAILED
        } else {
            match interpreter.handle_line(&String::from_utf8_lossy(&line)).await {
                Some(reply) => reply,
                None => {
                    debug!("Client requested close");
                    break;
                }
            }
        };
        writer.write_all(reply.to_string().as_bytes()).await?;
        writer.flush().await?;
    }

    writer.shutdown().await
}

/// Consume input through the next newline or EOF, [`MAX_LINE_LEN`] bytes at a time
async fn skip_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut sink = Vec::with_capacity(MAX_LINE_LEN);
    loop {
        sink.clear();
        let n = (&mut *reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut sink)
            .await?;
        if n == 0 || sink.ends_with(b"\n") {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, DuplexStream};

    fn interpreter() -> (Interpreter<DuplexStream>, DuplexStream) {
        let (host, radio) = tokio::io::duplex(4096);
        let session = RadioSession::new("test", host, Duration::from_millis(100));
        (Interpreter::new(Arc::new(session)), radio)
    }

    #[tokio::test]
    async fn test_connection_replies_in_order() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(b"v\nT1\nt\nzzz\nq\n").await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "PMR-171\nRPRT 0\n1\nRPRT -1\n");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_empty_line_closes_without_reply() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(b"\nv\n").await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_client_eof_ends_connection() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(b"t\n").await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "0\n");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(b"V\r\nq\r\n").await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "1.0.0\n");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_overlong_line_rejected() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(&[b'x'; 10 * 1024]).await.unwrap();
        client.write_all(b"\nv\nq\n").await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "RPRT -1\nPMR-171\n");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_endless_line_then_eof() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(&[b'x'; 10 * 1024]).await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "RPRT -1\n");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_line_at_limit_accepted() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        let mut line = vec![b' '; MAX_LINE_LEN - 2];
        line.extend_from_slice(b"v\nq\n");
        client.write_all(&line).await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "PMR-171\n");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let (interp, _radio) = interpreter();
        let (mut client, server_side) = tokio::io::duplex(1024);
        let task = tokio::spawn(serve_connection(server_side, interp));

        client.write_all(b"\xFF\xFE\nv\nq\n").await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "RPRT -1\nPMR-171\n");

        task.await.unwrap().unwrap();
    }
}
