//! Example application server
//!
//! Serves the index and help pages, a status endpoint and the static assets
//! of an application folder under the configured mount path.

pub mod http;
pub mod routes;
pub mod views;

use crate::config::Settings;
use crate::logging::{ACCESS_TARGET, APP_TARGET};
use anyhow::{Context as _, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use self::http::{parse_request, read_head, Response, Status};

/// A bound server, ready to accept connections
pub struct Server {
    listener: TcpListener,
    settings: Arc<Settings>,
}

impl Server {
    /// Bind to the configured port on all interfaces
    pub async fn bind(settings: Settings) -> Result<Server> {
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
        Server::bind_to(settings, addr).await
    }

    pub async fn bind_to(settings: Settings, addr: SocketAddr) -> Result<Server> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {}", addr))?;
        Ok(Server {
            listener,
            settings: Arc::new(settings),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("reading listener address")
    }

    /// Accept connections until `shutdown` completes
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(target: APP_TARGET, "Server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(target: APP_TARGET, "Shutting down server");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let settings = Arc::clone(&self.settings);
                        tokio::spawn(async move {
                            handle_connection(stream, peer, &settings).await;
                        });
                    }
                    Err(e) => warn!(target: APP_TARGET, "Failed to accept connection: {}", e),
                },
            }
        }

        Ok(())
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, settings: &Settings) {
    let started = Instant::now();

    let (response, include_body, line) = match read_head(&mut stream).await {
        Ok(head) => match parse_request(&head) {
            Ok(request) => {
                let response = routes::route(&request, settings).await;
                let line = format!("{} {}", request.method, request.path);
                (response, !request.is_head(), line)
            }
            Err(e) => {
                debug!(target: APP_TARGET, "bad request from {}: {}", peer, e);
                (Response::error(Status::BadRequest), true, "-".to_string())
            }
        },
        Err(e) => {
            debug!(target: APP_TARGET, "dropping connection from {}: {}", peer, e);
            return;
        }
    };

    if let Err(e) = stream.write_all(&response.to_bytes(include_body)).await {
        debug!(target: APP_TARGET, "failed to write response to {}: {}", peer, e);
    }
    let _ = stream.shutdown().await;

    if settings.enable_request_logger {
        info!(
            target: ACCESS_TARGET,
            "{} \"{}\" {} {} {}ms",
            peer.ip(),
            line,
            response.status.code(),
            response.body.len(),
            started.elapsed().as_millis()
        );
    }
}

/// Log the resolved settings
pub fn log_settings(settings: &Settings) {
    let separator = "-".repeat(80);
    info!(target: APP_TARGET, "{}", separator);
    for (key, value) in settings.entries() {
        info!(target: APP_TARGET, "{}={}", key, value);
    }
    info!(target: APP_TARGET, "{}", separator);

    if settings.enable_dynamic_css_compile {
        info!(
            target: APP_TARGET,
            "Dynamic stylesheet compilation requested; serving precompiled stylesheets from {}",
            settings.static_dir.display()
        );
    }
}

/// Run the server on a fresh runtime until Ctrl-C
pub fn run(settings: Settings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    runtime.block_on(async move {
        log_settings(&settings);
        let server = Server::bind(settings).await?;
        server
            .serve_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(target: APP_TARGET, "Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await
    })
}
