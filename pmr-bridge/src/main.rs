//! pmr171-rigctld
//!
//! Serves a PMR-171 attached to a serial port to rigctl clients over TCP.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pmr_bridge::{Cli, RadioSession, RigctlServer, Settings};
use pmr_detect::{prompt_for_port, DetectError, PortScanner};
use pmr_sim::{spawn_virtual_radio, VirtualRadio};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the port prompt stays readable on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pmr171_rigctld=info,pmr_bridge=info,pmr_protocol=info,pmr_sim=info,pmr_detect=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        return list_ports();
    }

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    cli.apply(&mut settings);

    if cli.save_config {
        let path = match &cli.config {
            Some(path) => settings.save_to(path).map(|()| path.clone())?,
            None => settings.save()?,
        };
        info!("Saved settings to {}", path.display());
    }

    info!("Starting PMR-171 rigctl bridge");

    if cli.simulate {
        let (link, radio) = spawn_virtual_radio(VirtualRadio::new("Virtual PMR-171"));
        let session = RadioSession::new("simulator", link, settings.query_timeout());
        serve(&settings, Arc::new(session)).await?;

        let radio = radio.shutdown().await.context("virtual radio failed")?;
        info!("Virtual radio stopped: {}", radio.state_summary());
        return Ok(());
    }

    let port = match settings.serial_port.clone() {
        Some(port) => port,
        None => choose_port().await?,
    };
    let session = RadioSession::open(&port, settings.baud_rate, settings.query_timeout())
        .with_context(|| format!("failed to open serial port {}", port))?;

    serve(&settings, Arc::new(session)).await
}

/// Run the rigctl server until Ctrl+C
async fn serve<T>(settings: &Settings, session: Arc<RadioSession<T>>) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let addr = settings.listen_addr();
    let server = RigctlServer::bind(addr.as_str(), session)
        .await
        .with_context(|| format!("failed to listen on {}", addr))?;

    tokio::select! {
        _ = server.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C")?;
            info!("Ctrl+C received, shutting down");
        }
    }

    Ok(())
}

fn list_ports() -> Result<()> {
    let ports = PortScanner::new().enumerate_ports()?;
    if ports.is_empty() {
        println!("No serial ports detected");
    }
    for port in ports {
        println!("{}", port.describe());
    }
    Ok(())
}

/// Ask the operator which serial port to use
async fn choose_port() -> Result<String> {
    let chosen = tokio::task::spawn_blocking(|| {
        let ports = PortScanner::new().enumerate_ports()?;
        let port = prompt_for_port(&ports, std::io::stdin().lock(), std::io::stdout())?;
        Ok::<_, DetectError>(port.port)
    })
    .await
    .context("port selection task panicked")?;

    chosen.context("no serial port selected")
}
