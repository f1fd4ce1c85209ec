//! WebSocket endpoint for the broadcast hub
//!
//! Runs on a dedicated `broadcast` thread with its own tokio runtime so that
//! slow network writes never reach the sampling loop. Binding happens before
//! the thread starts, so an address in use is reported to the caller.

use crate::broadcast::hub::BroadcastHub;
use crate::broadcast::BroadcastError;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::{Builder, Runtime};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

pub struct BroadcastServer;

impl BroadcastServer {
    /// Bind `addr` and start serving `hub` to WebSocket clients.
    ///
    /// Blocks briefly on the bind, so call it from synchronous code.
    pub fn spawn(addr: SocketAddr, hub: BroadcastHub) -> Result<BroadcastHandle, BroadcastError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("broadcast-io")
            .enable_all()
            .build()
            .map_err(BroadcastError::Runtime)?;

        let listener = runtime
            .block_on(TcpListener::bind(addr))
            .map_err(|source| BroadcastError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BroadcastError::Bind { addr, source })?;

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let thread = thread::Builder::new()
            .name("broadcast".to_string())
            .spawn(move || serve(runtime, listener, hub, token))
            .map_err(BroadcastError::Runtime)?;

        info!("✓ Broadcasting on ws://{}", local_addr);

        Ok(BroadcastHandle {
            local_addr,
            shutdown,
            thread: Some(thread),
        })
    }
}

fn serve(runtime: Runtime, listener: TcpListener, hub: BroadcastHub, token: CancellationToken) {
    runtime.block_on(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_subscriber(stream, peer, hub.clone(), token.clone()));
                    }
                    Err(e) => warn!("Broadcast accept failed: {}", e),
                },
            }
        }
    });

    // Open connections are dropped, not drained
    runtime.shutdown_timeout(Duration::from_millis(200));
    debug!("Broadcast thread stopped");
}

async fn handle_subscriber(stream: TcpStream, peer: SocketAddr, hub: BroadcastHub, token: CancellationToken) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };

    let (mut sink, mut incoming) = ws.split();
    let mut subscription = hub.subscribe();
    info!("Subscriber connected: {} ({} total)", peer, hub.subscriber_count());

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            document = subscription.next() => match document {
                Some(document) => {
                    if let Err(e) = sink.send(Message::Text(document.to_string())).await {
                        debug!("Send to {} failed: {}", peer, e);
                        break;
                    }
                }
                None => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("Read from {} failed: {}", peer, e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    drop(subscription);
    info!("Subscriber disconnected: {} ({} remaining)", peer, hub.subscriber_count());
}

/// Running broadcast endpoint; stops when dropped.
pub struct BroadcastHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl BroadcastHandle {
    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, drop every connection and wait for the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Broadcast thread panicked");
            }
        }
    }
}

impl Drop for BroadcastHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_conflict_is_reported() {
        let hub = BroadcastHub::new();
        let first = BroadcastServer::spawn("127.0.0.1:0".parse().unwrap(), hub.clone()).unwrap();

        let taken = first.local_addr();
        match BroadcastServer::spawn(taken, hub) {
            Err(BroadcastError::Bind { addr, .. }) => assert_eq!(addr, taken),
            Err(other) => panic!("expected bind error, got {}", other),
            Ok(_) => panic!("second bind on {} should fail", taken),
        }

        first.shutdown();
    }
}
