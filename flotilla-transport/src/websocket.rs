//! WebSocket broadcast of feature updates.
//!
//! The sender owns a small Tokio runtime that accepts browser connections.
//! Every connected client gets its own unbounded channel; `send` pushes the
//! message into each channel and never waits on the network, so a slow
//! renderer cannot stall the engine thread.

use crate::sender::Sender;
use crate::serializer::Payload;
use crate::TransportError;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

type Clients = Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub struct WebSocketSender {
    clients: Clients,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    runtime: Option<Runtime>,
}

impl WebSocketSender {
    /// Binds `address` (e.g. `127.0.0.1:8080` or `localhost:8080`) and starts
    /// accepting clients. Host names are resolved and the first address that
    /// binds is used.
    ///
    /// Binding happens before this returns, so an address in use is reported
    /// here rather than lost in a background task. Port `0` picks a free port;
    /// see [`WebSocketSender::local_addr`].
    pub fn bind(address: &str) -> Result<Self, TransportError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("flotilla-ws")
            .enable_all()
            .build()?;

        let listener = runtime
            .block_on(TcpListener::bind(address))
            .map_err(|e| TransportError::WebSocket(format!("cannot listen on '{}': {}", address, e)))?;
        let local_addr = listener.local_addr()?;
        let clients = Clients::default();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        runtime.spawn(accept_loop(listener, Arc::clone(&clients), shutdown_rx));
        info!("WebSocket server listening on: {}", local_addr);

        Ok(Self {
            clients,
            local_addr,
            shutdown: Some(shutdown_tx),
            runtime: Some(runtime),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the number of currently connected WebSocket clients.
    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|clients| clients.len()).unwrap_or(0)
    }
}

impl Sender for WebSocketSender {
    fn send(&mut self, payload: &Payload) -> Result<(), TransportError> {
        if self.runtime.is_none() {
            return Err(TransportError::Closed);
        }

        let message = match payload {
            Payload::Text(text) => Message::Text(text.clone()),
            Payload::Binary(bytes) => Message::Binary(bytes.clone()),
        };

        let mut clients = self
            .clients
            .lock()
            .map_err(|e| TransportError::WebSocket(format!("client list poisoned: {}", e)))?;

        // A failed send means the connection task is gone.
        clients.retain_mut(|client| match client.send(message.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!("Dropping disconnected WebSocket client");
                false
            }
        });

        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Ok(mut clients) = self.clients.lock() {
            clients.clear();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            info!("WebSocket server on {} stopped", self.local_addr);
        }
        Ok(())
    }
}

impl Drop for WebSocketSender {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn accept_loop(listener: TcpListener, clients: Clients, mut shutdown: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("New WebSocket connection from: {}", peer);
                    let clients = Arc::clone(&clients);
                    tokio::spawn(async move {
                        match handle_connection(stream, clients).await {
                            Ok(()) => info!("WebSocket connection to {} closed", peer),
                            Err(e) => warn!("WebSocket connection from {} failed: {}", peer, e),
                        }
                    });
                }
                Err(e) => warn!("Failed to accept WebSocket connection: {}", e),
            },
        }
    }
    debug!("WebSocket accept loop exited");
}

async fn handle_connection(stream: TcpStream, clients: Clients) -> Result<(), TransportError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| TransportError::WebSocket(format!("handshake failed: {}", e)))?;

    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<Message>();
    let client_id = client_tx.clone();
    clients
        .lock()
        .map_err(|e| TransportError::WebSocket(format!("client list poisoned: {}", e)))?
        .push(client_tx);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    let send_task = tokio::spawn(async move {
        while let Some(message) = client_rx.recv().await {
            if ws_sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Inbound traffic is ignored apart from the close handshake.
    let receive_task = tokio::spawn(async move {
        while let Some(message) = ws_stream.next().await {
            match message {
                Ok(msg) if msg.is_close() => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = receive_task => {},
    };

    clients
        .lock()
        .map_err(|e| TransportError::WebSocket(format!("client list poisoned: {}", e)))?
        .retain(|sender| !sender.same_channel(&client_id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Instant;
    use tokio_tungstenite::connect_async;

    fn wait_for_clients(sender: &WebSocketSender, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sender.client_count() != expected {
            assert!(Instant::now() < deadline, "expected {} clients", expected);
            sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn broadcasts_text_and_binary_to_connected_client() {
        let mut sender = WebSocketSender::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}", sender.local_addr());

        let client_rt = tokio::runtime::Runtime::new().unwrap();
        let (mut client, _) = client_rt.block_on(connect_async(url)).unwrap();
        wait_for_clients(&sender, 1);

        sender.send(&Payload::Text("{\"source\":\"vessel-source-1\"}".into())).unwrap();
        sender.send(&Payload::Binary(vec![7, 8, 9])).unwrap();

        let received = client_rt.block_on(async {
            let mut out = Vec::new();
            for _ in 0..2 {
                let next = tokio::time::timeout(Duration::from_secs(5), client.next()).await;
                out.push(next.unwrap().unwrap().unwrap());
            }
            out
        });
        assert_eq!(received[0], Message::Text("{\"source\":\"vessel-source-1\"}".into()));
        assert_eq!(received[1], Message::Binary(vec![7, 8, 9]));

        sender.close().unwrap();
        assert_eq!(sender.client_count(), 0);
        assert!(matches!(sender.send(&Payload::Text("late".into())), Err(TransportError::Closed)));
    }

    #[test]
    fn send_without_clients_is_ok() {
        let mut sender = WebSocketSender::bind("127.0.0.1:0").unwrap();
        sender.send(&Payload::Text("nobody listening".into())).unwrap();
        assert_eq!(sender.client_count(), 0);
    }

    #[test]
    fn binds_by_host_name() {
        let sender = WebSocketSender::bind("localhost:0").unwrap();
        assert!(sender.local_addr().ip().is_loopback());
        assert_ne!(sender.local_addr().port(), 0);
    }

    #[test]
    fn rejects_unparseable_address() {
        assert!(matches!(WebSocketSender::bind("not-an-address"), Err(TransportError::WebSocket(_))));
    }
}
