//! UDP transport with a background receive thread.
//!
//! The Tello protocol has no framing and no correlation IDs: each command is
//! one datagram and each reply is one datagram. The transport binds a local
//! socket, starts a receiver thread immediately (so a fast reply can never
//! race the thread start-up), and keeps only the newest unread reply in a
//! single-slot [`PendingResponse`]. A newer datagram overwrites an unread one.
//!
//! The receive thread polls a shutdown flag between reads, using the socket
//! read timeout as the poll interval. [`Transport::close`] sets the flag and
//! joins the thread; `Drop` does the same, so the socket is released on every
//! exit path.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::error::{TelloError, TelloResult};

/// Largest reply the Tello sends.
pub const MAX_RESPONSE_SIZE: usize = 256;

/// Socket read timeout, bounds how long `close` waits for the receiver.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Single-slot holder for the most recent unread reply.
///
/// Written only by the receive thread, taken only by the command path.
#[derive(Debug, Default)]
pub struct PendingResponse {
    slot: Mutex<Option<Vec<u8>>>,
    arrived: Condvar,
}

impl PendingResponse {
    /// Store a payload, replacing any unread one, and wake the waiter.
    pub fn store(&self, payload: Vec<u8>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            trace!("Overwriting unread response");
        }
        *slot = Some(payload);
        self.arrived.notify_all();
    }

    /// Take the unread payload, leaving the slot empty.
    pub fn take(&self) -> Option<Vec<u8>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn clear(&self) {
        self.take();
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Block until a payload is present or `deadline` passes.
    ///
    /// Returns the payload (clearing the slot) or `None` on expiry.
    pub fn wait_take(&self, deadline: Instant) -> Option<Vec<u8>> {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let timeout = deadline.saturating_duration_since(Instant::now());
        let (mut guard, _) = self
            .arrived
            .wait_timeout_while(guard, timeout, |slot| slot.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard.take()
    }
}

/// Bound UDP socket plus its receive thread.
pub struct Transport {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    pending: Arc<PendingResponse>,
    shutdown: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
}

impl Transport {
    /// Bind `local` and start receiving. Datagrams are sent to `remote`.
    ///
    /// # Errors
    ///
    /// Returns [`TelloError::Bind`] if the address is unavailable or the
    /// receive thread cannot be started.
    pub fn open(local: SocketAddr, remote: SocketAddr) -> TelloResult<Self> {
        let bind_err = |source: std::io::Error| TelloError::Bind {
            addr: local,
            source,
        };

        let socket = UdpSocket::bind(local).map_err(bind_err)?;
        socket
            .set_read_timeout(Some(RECV_POLL_INTERVAL))
            .map_err(bind_err)?;
        let socket = Arc::new(socket);

        let pending = Arc::new(PendingResponse::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let receiver = {
            let socket = socket.clone();
            let pending = pending.clone();
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("tello-rx".to_string())
                .spawn(move || receive_loop(&socket, &pending, &shutdown))
                .map_err(bind_err)?
        };

        debug!(
            "Bound {} for Tello at {}",
            socket.local_addr().unwrap_or(local),
            remote
        );

        Ok(Self {
            socket,
            remote,
            pending,
            shutdown,
            receiver: Some(receiver),
        })
    }

    /// Write one datagram to the remote endpoint.
    pub fn send_datagram(&self, bytes: &[u8]) -> TelloResult<()> {
        self.socket
            .send_to(bytes, self.remote)
            .map_err(TelloError::Send)?;
        Ok(())
    }

    /// Wait for the next reply until `deadline`, consuming it.
    pub fn wait_response(&self, deadline: Instant) -> Option<Vec<u8>> {
        self.pending.wait_take(deadline)
    }

    pub fn clear_pending(&self) {
        self.pending.clear();
    }

    pub fn take_pending(&self) -> Option<Vec<u8>> {
        self.pending.take()
    }

    pub fn local_addr(&self) -> TelloResult<SocketAddr> {
        self.socket.local_addr().map_err(TelloError::Socket)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// True while the receive thread is running.
    pub fn is_receiving(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the receive thread. Safe to call twice.
    ///
    /// The socket itself is released when the transport is dropped.
    pub fn close(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                warn!("Tello receive thread panicked");
            }
            debug!("Closed transport to {}", self.remote);
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

fn receive_loop(socket: &UdpSocket, pending: &PendingResponse, shutdown: &AtomicBool) {
    let mut buf = [0u8; MAX_RESPONSE_SIZE];

    while !shutdown.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                let payload = buf[..len].to_vec();
                trace!("Datagram of {} bytes from {}", len, peer);
                info!("{}", String::from_utf8_lossy(&payload));
                pending.store(payload);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => {
                debug!("Receive loop stopped: {e}");
                break;
            }
        }
    }
}
