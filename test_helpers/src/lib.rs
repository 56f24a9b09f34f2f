//! Test support for the Tello transport.
//!
//! [`MockTello`] stands in for the drone: it binds a UDP socket on localhost,
//! records every command it receives, and answers according to a scripted
//! responder. Replies can be immediate, delayed (sent from a helper thread so
//! the mock keeps receiving), or withheld entirely to exercise timeouts.
//!
//! ```no_run
//! use test_helpers::MockTello;
//!
//! let mock = MockTello::with_replies(&[("command", "ok"), ("battery?", "87")]);
//! // point a session at mock.addr() ...
//! assert_eq!(mock.received(), vec!["command", "battery?"]);
//! ```

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use once_cell::sync::Lazy;
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How the mock answers one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Reply immediately with this text.
    Text(String),
    /// Reply with this text after a delay.
    Delayed(Duration, String),
    /// Never reply.
    Silent,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn after(delay: Duration, text: impl Into<String>) -> Self {
        Reply::Delayed(delay, text.into())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MockError {
    #[error("Failed to bind mock Tello socket: {0}")]
    Bind(#[from] std::io::Error),
}

/// Simulated Tello listening on `127.0.0.1`.
pub struct MockTello {
    socket: Arc<UdpSocket>,
    addr: SocketAddr,
    log: Arc<Mutex<Vec<String>>>,
    commands: Receiver<String>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockTello {
    /// Start a mock that answers with `responder`.
    ///
    /// # Panics
    ///
    /// Panics if the localhost socket cannot be bound.
    pub fn spawn<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Reply + Send + 'static,
    {
        Self::try_spawn(responder).expect("Failed to start mock Tello")
    }

    pub fn try_spawn<F>(responder: F) -> Result<Self, MockError>
    where
        F: FnMut(&str) -> Reply + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let addr = socket.local_addr()?;
        let socket = Arc::new(socket);

        let log = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, commands) = crossbeam_channel::unbounded();

        let handle = {
            let socket = socket.clone();
            let log = log.clone();
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("mock-tello".to_string())
                .spawn(move || serve(&socket, responder, &log, &tx, &shutdown))?
        };

        debug!("Mock Tello listening on {addr}");
        Ok(Self {
            socket,
            addr,
            log,
            commands,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Start a mock with a fixed command → reply table. Unlisted commands get
    /// no reply.
    pub fn with_replies(replies: &[(&str, &str)]) -> Self {
        let table: HashMap<String, String> = replies
            .iter()
            .map(|(cmd, reply)| (cmd.to_string(), reply.to_string()))
            .collect();
        Self::spawn(move |cmd| match table.get(cmd) {
            Some(reply) => Reply::text(reply.clone()),
            None => Reply::Silent,
        })
    }

    /// Address the mock listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command received so far, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Wait for the next command not yet returned by this method.
    pub fn next_command(&self, timeout: Duration) -> Option<String> {
        self.commands.recv_timeout(timeout).ok()
    }

    /// Send a datagram that does not answer any command.
    pub fn send_unsolicited(&self, to: SocketAddr, payload: &str) {
        self.socket
            .send_to(payload.as_bytes(), to)
            .expect("Failed to send unsolicited datagram");
    }
}

impl Drop for MockTello {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve<F>(
    socket: &Arc<UdpSocket>,
    mut responder: F,
    log: &Mutex<Vec<String>>,
    commands: &Sender<String>,
    shutdown: &AtomicBool,
) where
    F: FnMut(&str) -> Reply,
{
    let mut buf = [0u8; 1024];

    while !shutdown.load(Ordering::Acquire) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(_) => continue,
        };

        let command = String::from_utf8_lossy(&buf[..len]).into_owned();
        trace!("Mock Tello got {command:?} from {from}");
        log.lock().unwrap().push(command.clone());
        let _ = commands.send(command.clone());

        match responder(&command) {
            Reply::Text(text) => {
                let _ = socket.send_to(text.as_bytes(), from);
            }
            Reply::Delayed(delay, text) => {
                let socket = socket.clone();
                thread::spawn(move || {
                    thread::sleep(delay);
                    let _ = socket.send_to(text.as_bytes(), from);
                });
            }
            Reply::Silent => {}
        }
    }
}

static TEST_LOGGING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
});

/// Route `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_logging() {
    Lazy::force(&TEST_LOGGING);
}
