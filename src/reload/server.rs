//! WebSocket Server for Live Reload
//!
//! An acceptor thread performs the WebSocket handshake and registers each
//! client. Broadcasts are queued to a sender thread, which writes to every
//! registered client and drops the ones whose socket has gone away or stalls
//! past the write timeout. Callers on the event loop never block on a socket.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::HotReloadMessage;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the non-blocking acceptor.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Upper bound for a client to complete the handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// A client that cannot take a message within this long is dropped.
const SEND_TIMEOUT: Duration = Duration::from_secs(1);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Live-reload hub: a cloneable handle to the WebSocket listener and its clients.
#[derive(Clone)]
pub struct ReloadHub {
    port: u16,
    clients: Clients,
    outbox: mpsc::UnboundedSender<String>,
    stopped: Arc<AtomicBool>,
}

impl ReloadHub {
    /// Bind on `interface:base_port` (retrying upward) and start accepting clients.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
        listener.set_nonblocking(true)?;
        if port != base_port && base_port != 0 {
            crate::log!("reload"; "port {} in use, using {} instead", base_port, port);
        }

        let clients = Clients::default();
        let (outbox, queue) = mpsc::unbounded_channel();
        let hub = Self {
            port,
            clients: Arc::clone(&clients),
            outbox,
            stopped: Arc::new(AtomicBool::new(false)),
        };

        // Exits once every hub handle (and so every sender) is gone.
        thread::Builder::new()
            .name("reload-send".into())
            .spawn(move || send_loop(&clients, queue))?;

        let acceptor = hub.clone();
        thread::Builder::new()
            .name("reload-accept".into())
            .spawn(move || acceptor.accept_loop(listener))?;

        crate::debug!("reload"; "ws://{}", SocketAddr::new(interface, port));
        Ok(hub)
    }

    /// Actual bound port (may differ from the configured one after retry).
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Ask every page to reload.
    pub fn reload(&self) {
        self.broadcast(&HotReloadMessage::Reload);
    }

    /// Ask every page to refresh the stylesheet at `path`.
    pub fn notify_css(&self, path: &str) {
        self.broadcast(&HotReloadMessage::css(path));
    }

    /// Queue a message for all clients. Messages are delivered in order.
    pub fn broadcast(&self, msg: &HotReloadMessage) {
        if self.outbox.send(msg.to_json()).is_err() {
            crate::debug!("reload"; "sender thread gone, message dropped");
        }
    }

    /// Stop accepting and close every client.
    pub fn close(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let mut clients = self.clients.lock();
        for mut ws in clients.drain(..) {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
    }

    fn accept_loop(&self, listener: TcpListener) {
        while !self.stopped.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);
                    self.add_client(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }
    }

    fn add_client(&self, stream: TcpStream) {
        // Handshake in blocking mode with a deadline, so one stalled client
        // cannot hold up the acceptor.
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));

        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("reload"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_read_timeout(None);
        let _ = ws.get_ref().set_write_timeout(Some(SEND_TIMEOUT));

        if let Err(e) = ws.send(Message::text(HotReloadMessage::Connected.to_json())) {
            crate::log!("reload"; "failed to send connected message: {}", e);
            return;
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("reload"; "client registered (total: {})", clients.len());
    }
}

/// Write each queued message to every client, dropping the ones that fail.
fn send_loop(
    clients: &Mutex<Vec<WebSocket<TcpStream>>>,
    mut queue: mpsc::UnboundedReceiver<String>,
) {
    while let Some(text) = queue.blocking_recv() {
        let mut clients = clients.lock();
        if clients.is_empty() {
            crate::debug!("reload"; "no clients connected");
            continue;
        }

        clients.retain_mut(|ws| match ws.send(Message::text(text.clone())) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client dropped: {}", e);
                false
            }
        });
        crate::debug!("reload"; "sent {} to {} client(s)", text, clients.len());
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind live reload server after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Instant;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn wait_for_clients(hub: &ReloadHub, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while hub.client_count() < n {
            assert!(Instant::now() < deadline, "client never registered");
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn read_json(
        ws: &mut WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>,
    ) -> HotReloadMessage {
        let msg = ws.read().unwrap();
        serde_json::from_str(msg.to_text().unwrap()).unwrap()
    }

    #[test]
    fn test_client_receives_connected_then_broadcasts() {
        let hub = ReloadHub::bind(LOCALHOST, 0).unwrap();
        let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{}", hub.port())).unwrap();

        assert_eq!(read_json(&mut ws), HotReloadMessage::Connected);
        wait_for_clients(&hub, 1);

        hub.notify_css("/css/style.min.css");
        hub.reload();
        assert_eq!(read_json(&mut ws), HotReloadMessage::css("/css/style.min.css"));
        assert_eq!(read_json(&mut ws), HotReloadMessage::Reload);

        hub.close();
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn test_port_retry_when_busy() {
        let taken = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let busy = taken.local_addr().unwrap().port();

        let hub = ReloadHub::bind(LOCALHOST, busy).unwrap();
        assert_ne!(hub.port(), busy);
        hub.close();
    }

    #[test]
    fn test_stalled_client_does_not_block_broadcast() {
        let hub = ReloadHub::bind(LOCALHOST, 0).unwrap();
        // Reads the connected message, then never reads again.
        let (mut stalled, _) =
            tungstenite::connect(format!("ws://127.0.0.1:{}", hub.port())).unwrap();
        assert_eq!(read_json(&mut stalled), HotReloadMessage::Connected);
        wait_for_clients(&hub, 1);

        let large = "x".repeat(1 << 20);
        let start = Instant::now();
        for _ in 0..32 {
            hub.notify_css(&large);
        }
        assert!(start.elapsed() < Duration::from_secs(1));

        let deadline = Instant::now() + Duration::from_secs(15);
        while hub.client_count() > 0 {
            assert!(Instant::now() < deadline, "stalled client was never dropped");
            thread::sleep(Duration::from_millis(50));
        }
        hub.close();
    }

    #[test]
    fn test_broadcast_without_clients() {
        let hub = ReloadHub::bind(LOCALHOST, 0).unwrap();
        hub.reload();
        assert_eq!(hub.client_count(), 0);
        hub.close();
    }
}
