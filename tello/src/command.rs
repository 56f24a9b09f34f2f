//! Tello SDK command vocabulary.
//!
//! Commands are plain ASCII text. Control commands take space-separated
//! arguments (`forward 50`, `flip f`); read commands end with `?`
//! (`battery?`). Arguments are written without units, in cm, cm/s, or degrees.

use std::fmt;
use std::str::FromStr;

use strum::{Display, EnumIter, EnumString};

use crate::error::{TelloError, TelloResult};

/// Enter SDK mode. Must be the first command of a session.
pub const COMMAND_MODE: &str = "command";
pub const TAKEOFF: &str = "takeoff";
pub const LAND: &str = "land";
pub const QUERY_SPEED: &str = "speed?";
pub const QUERY_BATTERY: &str = "battery?";
pub const QUERY_TIME: &str = "time?";

/// Unit suffix the drone may append to a `time?` reply.
pub const UNIT_TIME: &str = "s";
/// Unit suffix the drone may append to a `speed?` reply.
pub const UNIT_SPEED: &str = "cm/s";

/// Reply to a control command that was accepted.
pub const RESPONSE_OK: &str = "ok";

/// Largest rotation a single `cw`/`ccw` command accepts.
pub const MAX_ROTATION_DEG: u16 = 360;

/// Flip direction, serialized as the single- or two-letter SDK code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum FlipDirection {
    #[strum(serialize = "l")]
    Left,
    #[strum(serialize = "r")]
    Right,
    #[strum(serialize = "f")]
    Forward,
    #[strum(serialize = "b")]
    Back,
    #[strum(serialize = "lb")]
    BackLeft,
    #[strum(serialize = "lf")]
    ForwardLeft,
    #[strum(serialize = "rb")]
    BackRight,
    #[strum(serialize = "rf")]
    ForwardRight,
}

/// Linear move direction. The wire name is the lowercase variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// A yaw rotation in whole degrees (1..=360).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise(u16),
    CounterClockwise(u16),
}

impl Rotation {
    /// Build a rotation from a signed angle.
    ///
    /// Positive angles turn counter-clockwise, negative angles clockwise. The
    /// transmitted angle is always the magnitude.
    pub fn from_signed(degrees: i32) -> TelloResult<Self> {
        let magnitude = check_degrees(degrees.unsigned_abs())?;
        if degrees > 0 {
            Ok(Rotation::CounterClockwise(magnitude))
        } else {
            Ok(Rotation::Clockwise(magnitude))
        }
    }

    pub fn clockwise(degrees: u32) -> TelloResult<Self> {
        Ok(Rotation::Clockwise(check_degrees(degrees)?))
    }

    pub fn counter_clockwise(degrees: u32) -> TelloResult<Self> {
        Ok(Rotation::CounterClockwise(check_degrees(degrees)?))
    }

    pub fn degrees(&self) -> u16 {
        match *self {
            Rotation::Clockwise(d) | Rotation::CounterClockwise(d) => d,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Clockwise(d) => write!(f, "cw {d}"),
            Rotation::CounterClockwise(d) => write!(f, "ccw {d}"),
        }
    }
}

fn check_degrees(degrees: u32) -> TelloResult<u16> {
    if degrees == 0 || degrees > u32::from(MAX_ROTATION_DEG) {
        return Err(TelloError::InvalidArgument(format!(
            "rotation must be 1-{MAX_ROTATION_DEG} degrees, got {degrees}"
        )));
    }
    Ok(degrees as u16)
}

pub fn flip(direction: FlipDirection) -> String {
    format!("flip {direction}")
}

pub fn move_by(direction: MoveDirection, distance_cm: u32) -> String {
    format!("{direction} {distance_cm}")
}

pub fn set_speed(speed_cm_s: u32) -> String {
    format!("speed {speed_cm_s}")
}

/// Parse a numeric reply.
///
/// Surrounding whitespace is ignored, as is a single trailing `unit` when the
/// query has one (`12s` for `time?`). Anything else that fails to parse is a
/// [`TelloError::ResponseParse`].
pub fn parse_numeric<T: FromStr>(
    command: &str,
    response: &str,
    unit: Option<&str>,
) -> TelloResult<T> {
    let trimmed = response.trim();
    let value = unit
        .and_then(|unit| trimmed.strip_suffix(unit))
        .unwrap_or(trimmed);
    value.parse().map_err(|_| TelloError::ResponseParse {
        command: command.to_string(),
        response: response.to_string(),
    })
}

/// Unit suffix a read command's reply may carry.
pub fn reply_unit(command: &str) -> Option<&'static str> {
    match command {
        QUERY_TIME => Some(UNIT_TIME),
        QUERY_SPEED => Some(UNIT_SPEED),
        _ => None,
    }
}

/// True if the reply is exactly the SDK's acceptance token.
///
/// Only a trailing CR/LF is tolerated; case must match.
pub fn is_ok(response: &str) -> bool {
    response.trim_end_matches(['\r', '\n']) == RESPONSE_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_flip_codes() {
        let codes: Vec<String> = FlipDirection::iter().map(|d| d.to_string()).collect();
        assert_eq!(codes, ["l", "r", "f", "b", "lb", "lf", "rb", "rf"]);
        assert_eq!(flip(FlipDirection::Forward), "flip f");
        assert_eq!(flip(FlipDirection::BackRight), "flip rb");
    }

    #[test]
    fn test_flip_from_code() {
        assert_eq!("lf".parse::<FlipDirection>().unwrap(), FlipDirection::ForwardLeft);
        assert!("x".parse::<FlipDirection>().is_err());
    }

    #[test]
    fn test_move_commands() {
        assert_eq!(move_by(MoveDirection::Forward, 50), "forward 50");
        assert_eq!(move_by(MoveDirection::Back, 20), "back 20");
        assert_eq!(move_by(MoveDirection::Down, 100), "down 100");
        assert_eq!("up".parse::<MoveDirection>().unwrap(), MoveDirection::Up);
    }

    #[test]
    fn test_rotation_sign_convention() {
        assert_eq!(Rotation::from_signed(-90).unwrap().to_string(), "cw 90");
        assert_eq!(Rotation::from_signed(90).unwrap().to_string(), "ccw 90");
        assert_eq!(Rotation::from_signed(-360).unwrap().degrees(), 360);
    }

    #[test]
    fn test_rotation_range() {
        assert!(matches!(
            Rotation::from_signed(0),
            Err(TelloError::InvalidArgument(_))
        ));
        assert!(Rotation::from_signed(361).is_err());
        assert!(Rotation::from_signed(i32::MIN).is_err());
        assert!(Rotation::clockwise(1).is_ok());
        assert!(Rotation::counter_clockwise(400).is_err());
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric::<u32>(QUERY_BATTERY, "87", None).unwrap(), 87);
        assert_eq!(parse_numeric::<u32>(QUERY_BATTERY, "87\r\n", None).unwrap(), 87);
        assert_eq!(parse_numeric::<u32>(QUERY_TIME, "12s", Some(UNIT_TIME)).unwrap(), 12);
        assert_eq!(parse_numeric::<u32>(QUERY_TIME, "12", Some(UNIT_TIME)).unwrap(), 12);
        assert_relative_eq!(
            parse_numeric::<f64>(QUERY_SPEED, "100.0", Some(UNIT_SPEED)).unwrap(),
            100.0
        );
        assert_relative_eq!(
            parse_numeric::<f64>(QUERY_SPEED, "80.0cm/s", Some(UNIT_SPEED)).unwrap(),
            80.0
        );
    }

    #[test]
    fn test_parse_numeric_rejects_text() {
        let err = parse_numeric::<u32>(QUERY_BATTERY, "abc", None).unwrap_err();
        match err {
            TelloError::ResponseParse { command, response } => {
                assert_eq!(command, "battery?");
                assert_eq!(response, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_numeric_rejects_trailing_garbage() {
        assert!(parse_numeric::<u32>(QUERY_BATTERY, "87abc", None).is_err());
        assert!(parse_numeric::<u32>(QUERY_BATTERY, "87s", None).is_err());
        assert!(parse_numeric::<u32>(QUERY_TIME, "12ss", Some(UNIT_TIME)).is_err());
        assert!(parse_numeric::<f64>(QUERY_SPEED, "80.0s", Some(UNIT_SPEED)).is_err());
    }

    #[test]
    fn test_reply_unit() {
        assert_eq!(reply_unit(QUERY_TIME), Some("s"));
        assert_eq!(reply_unit(QUERY_SPEED), Some("cm/s"));
        assert_eq!(reply_unit(QUERY_BATTERY), None);
    }

    #[test]
    fn test_is_ok() {
        assert!(is_ok("ok"));
        assert!(is_ok("ok\r\n"));
        assert!(!is_ok("error"));
    }

    #[test]
    fn test_is_ok_is_exact() {
        assert!(!is_ok("OK"));
        assert!(!is_ok("Ok"));
        assert!(!is_ok(" ok \r\n"));
        assert!(!is_ok("ok!"));
    }
}
