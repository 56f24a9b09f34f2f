//! Driver for the Ryze Tello text SDK over UDP.
//!
//! The Tello accepts one plain-text command per datagram on port 8889 and
//! answers each with one plain-text datagram. This crate provides:
//!
//! - [`Transport`] - the bound UDP socket and its background receive thread
//! - [`Tello`] - a command session: handshake, one-at-a-time send with
//!   timeout, and named flight commands
//! - [`TelloConfig`] - construction options, loadable from JSON
//!
//! Only one command is in flight at a time. [`Tello::send`] takes `&mut self`,
//! so a second command cannot be issued while the first is waiting.

pub mod command;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use command::{FlipDirection, MoveDirection, Rotation};
pub use config::{TelloConfig, DEFAULT_PORT, DEFAULT_TELLO_IP};
pub use error::{TelloError, TelloResult};
pub use session::{CommandState, Tello};
pub use transport::{PendingResponse, Transport, MAX_RESPONSE_SIZE};
