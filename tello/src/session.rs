//! Tello command session.
//!
//! A [`Tello`] owns a [`Transport`] and runs one command at a time:
//!
//! 1. clear any unread reply,
//! 2. start the deadline (`command_timeout` from the config),
//! 3. send the command text as one datagram,
//! 4. wait until a reply lands in the pending slot or the deadline passes.
//!
//! The protocol carries no correlation ID. A reply that arrives after its
//! command timed out is dropped by the next command's clear step, unless it
//! arrives inside that next command's wait window, in which case it is
//! returned as that command's reply.
//!
//! # Example
//!
//! ```no_run
//! use tello::{FlipDirection, Tello, TelloConfig};
//! use std::time::Duration;
//!
//! let config = TelloConfig::default().with_command_timeout(Duration::from_secs(5));
//! let mut drone = Tello::open(config)?;
//!
//! println!("Battery: {}%", drone.battery_percent_remaining()?);
//! drone.take_off()?;
//! drone.flip(FlipDirection::Forward)?;
//! drone.land()?;
//! # Ok::<(), tello::TelloError>(())
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use strum::Display;
use tracing::{debug, info};

use crate::command::{self, FlipDirection, MoveDirection, Rotation};
use crate::config::TelloConfig;
use crate::error::{TelloError, TelloResult};
use crate::transport::Transport;

/// Where the most recent command ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CommandState {
    Idle,
    AwaitingReply,
    Completed,
    TimedOut,
}

/// A session with a Tello that has accepted SDK command mode.
pub struct Tello {
    transport: Transport,
    config: TelloConfig,
    last_state: CommandState,
}

impl Tello {
    /// Open a session with the default configuration
    /// (`192.168.10.1:8889`, bound on port 8889).
    pub fn connect() -> TelloResult<Self> {
        Self::open(TelloConfig::default())
    }

    /// Bind the local socket and put the drone into command mode.
    ///
    /// # Errors
    ///
    /// - [`TelloError::Bind`] if the local address is unavailable.
    /// - [`TelloError::Handshake`] if the drone answers `command` with
    ///   anything but `ok`.
    /// - [`TelloError::CommandTimeout`] if the drone does not answer at all.
    ///
    /// No session is returned on failure and the socket is released.
    pub fn open(config: TelloConfig) -> TelloResult<Self> {
        config.validate()?;
        let transport = Transport::open(config.local_addr()?, config.remote_addr()?)?;

        let mut tello = Self {
            transport,
            config,
            last_state: CommandState::Idle,
        };
        tello.enter_command_mode()?;

        info!("Tello at {} in command mode", tello.remote_addr());
        Ok(tello)
    }

    fn enter_command_mode(&mut self) -> TelloResult<()> {
        let response = self.send(command::COMMAND_MODE)?;
        if !command::is_ok(&response) {
            return Err(TelloError::Handshake { response });
        }
        Ok(())
    }

    /// Send a raw command and wait for its reply.
    ///
    /// Returns the reply decoded as UTF-8 (invalid sequences are replaced).
    ///
    /// # Errors
    ///
    /// [`TelloError::Send`] on a socket fault, [`TelloError::CommandTimeout`]
    /// if nothing arrives within the command timeout.
    pub fn send(&mut self, command: &str) -> TelloResult<String> {
        info!("{command}");

        self.transport.clear_pending();
        let deadline = Instant::now() + self.config.command_timeout();
        self.set_state(CommandState::AwaitingReply);

        if let Err(e) = self.transport.send_datagram(command.as_bytes()) {
            self.set_state(CommandState::Idle);
            return Err(e);
        }

        match self.transport.wait_response(deadline) {
            Some(payload) => {
                self.set_state(CommandState::Completed);
                Ok(String::from_utf8_lossy(&payload).into_owned())
            }
            None => {
                self.set_state(CommandState::TimedOut);
                Err(TelloError::CommandTimeout {
                    command: command.to_string(),
                })
            }
        }
    }

    fn set_state(&mut self, state: CommandState) {
        debug!("{} -> {}", self.last_state, state);
        self.last_state = state;
    }

    /// Send a read command and parse the reply as a number, allowing only
    /// the unit suffix that command's reply can carry.
    fn query<T: std::str::FromStr>(&mut self, command: &str) -> TelloResult<T> {
        let response = self.send(command)?;
        command::parse_numeric(command, &response, command::reply_unit(command))
    }

    pub fn config(&self) -> &TelloConfig {
        &self.config
    }

    /// State of the most recent command.
    pub fn last_state(&self) -> CommandState {
        self.last_state
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.transport.remote_addr()
    }

    pub fn local_addr(&self) -> TelloResult<SocketAddr> {
        self.transport.local_addr()
    }

    /// End the session and release the socket.
    pub fn close(mut self) {
        self.transport.close();
    }

    // ==================== Flight Control ====================

    /// Take off, then block for the configured settle time.
    ///
    /// Returns the drone's reply (`ok` or `error`).
    pub fn take_off(&mut self) -> TelloResult<String> {
        let response = self.send(command::TAKEOFF)?;

        let settle = self.config.takeoff_settle();
        if !settle.is_zero() {
            debug!("Waiting {:?} for the drone to settle", settle);
            std::thread::sleep(settle);
        }
        Ok(response)
    }

    pub fn land(&mut self) -> TelloResult<String> {
        self.send(command::LAND)
    }

    pub fn flip(&mut self, direction: FlipDirection) -> TelloResult<String> {
        self.send(&command::flip(direction))
    }

    /// Flip using the SDK letter code (`l`, `r`, `f`, `b`, `lb`, `lf`, `rb`, `rf`).
    pub fn flip_str(&mut self, code: &str) -> TelloResult<String> {
        let direction: FlipDirection = code.parse().map_err(|_| {
            TelloError::InvalidArgument(format!("unknown flip direction {code:?}"))
        })?;
        self.flip(direction)
    }

    // ==================== Movement ====================

    /// Move `distance_cm` in `direction`.
    pub fn move_by(&mut self, direction: MoveDirection, distance_cm: u32) -> TelloResult<String> {
        self.send(&command::move_by(direction, distance_cm))
    }

    pub fn move_forward(&mut self, distance_cm: u32) -> TelloResult<String> {
        self.move_by(MoveDirection::Forward, distance_cm)
    }

    pub fn move_backward(&mut self, distance_cm: u32) -> TelloResult<String> {
        self.move_by(MoveDirection::Back, distance_cm)
    }

    pub fn move_left(&mut self, distance_cm: u32) -> TelloResult<String> {
        self.move_by(MoveDirection::Left, distance_cm)
    }

    pub fn move_right(&mut self, distance_cm: u32) -> TelloResult<String> {
        self.move_by(MoveDirection::Right, distance_cm)
    }

    pub fn move_up(&mut self, distance_cm: u32) -> TelloResult<String> {
        self.move_by(MoveDirection::Up, distance_cm)
    }

    pub fn move_down(&mut self, distance_cm: u32) -> TelloResult<String> {
        self.move_by(MoveDirection::Down, distance_cm)
    }

    // ==================== Rotation ====================

    /// Rotate by a signed angle: positive is counter-clockwise, negative is
    /// clockwise. The magnitude must be 1-360 degrees.
    ///
    /// # Errors
    ///
    /// [`TelloError::InvalidArgument`] for an out-of-range angle; nothing is
    /// sent in that case.
    pub fn rotate(&mut self, degrees: i32) -> TelloResult<String> {
        let rotation = Rotation::from_signed(degrees)?;
        self.send(&rotation.to_string())
    }

    pub fn rotate_cw(&mut self, degrees: u32) -> TelloResult<String> {
        let rotation = Rotation::clockwise(degrees)?;
        self.send(&rotation.to_string())
    }

    pub fn rotate_ccw(&mut self, degrees: u32) -> TelloResult<String> {
        let rotation = Rotation::counter_clockwise(degrees)?;
        self.send(&rotation.to_string())
    }

    // ==================== Speed ====================

    pub fn set_speed(&mut self, speed_cm_s: u32) -> TelloResult<String> {
        self.send(&command::set_speed(speed_cm_s))
    }

    /// Current speed setting in cm/s.
    pub fn speed(&mut self) -> TelloResult<f64> {
        self.query(command::QUERY_SPEED)
    }

    // ==================== Status Queries ====================

    /// Percent battery remaining.
    pub fn battery_percent_remaining(&mut self) -> TelloResult<u32> {
        self.query(command::QUERY_BATTERY)
    }

    /// Seconds of flight time (motor-on time) so far.
    pub fn flight_time(&mut self) -> TelloResult<u32> {
        self.query(command::QUERY_TIME)
    }
}
