//! Command-line control for a Tello.
//!
//! Subcommands:
//! - `takeoff`, `land`: basic flight
//! - `flip`, `move`, `rotate`: maneuvers
//! - `speed`: set or query speed
//! - `status`: battery, speed and flight time
//! - `repl`: interactive raw SDK commands

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use tello::{FlipDirection, MoveDirection, Tello, TelloConfig};
use tracing::info;

/// Default timeout for the CLI. Takeoff and landing replies take seconds.
const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Tello SDK control tool
#[derive(Parser, Debug)]
#[command(name = "tello_tool")]
#[command(about = "Send SDK commands to a Ryze Tello over UDP")]
#[command(version)]
struct Args {
    /// JSON config file (fields not given fall back to defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tello IP address
    #[arg(long, global = true)]
    tello_ip: Option<String>,

    /// Tello command port
    #[arg(long, global = true)]
    tello_port: Option<u16>,

    /// Local UDP port to bind
    #[arg(long, global = true)]
    local_port: Option<u16>,

    /// Seconds to wait for each reply
    #[arg(short, long, global = true)]
    timeout: Option<f64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take off and hover
    Takeoff {
        /// Seconds to wait after the reply before returning
        /// (overrides the config file)
        #[arg(long)]
        settle: Option<f64>,
    },

    /// Land
    Land,

    /// Flip in a direction (l, r, f, b, lb, lf, rb, rf)
    Flip { direction: FlipDirection },

    /// Move a distance in cm (forward, back, left, right, up, down)
    Move {
        direction: MoveDirection,
        distance_cm: u32,
    },

    /// Rotate; positive is counter-clockwise, negative clockwise
    Rotate {
        #[arg(allow_hyphen_values = true)]
        degrees: i32,
    },

    /// Set speed in cm/s, or query it when no value is given
    Speed { cm_per_s: Option<u32> },

    /// Query battery, speed and flight time
    Status,

    /// Interactive SDK command REPL
    Repl,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config = build_config(&args)?;

    info!("Connecting to Tello at {}:{}...", config.tello_ip, config.tello_port);
    let mut tello = Tello::open(config)?;

    match args.command {
        Command::Takeoff { .. } => info!("takeoff: {}", tello.take_off()?.trim()),
        Command::Land => info!("land: {}", tello.land()?.trim()),
        Command::Flip { direction } => info!("flip: {}", tello.flip(direction)?.trim()),
        Command::Move {
            direction,
            distance_cm,
        } => info!(
            "{direction}: {}",
            tello.move_by(direction, distance_cm)?.trim()
        ),
        Command::Rotate { degrees } => info!("rotate: {}", tello.rotate(degrees)?.trim()),
        Command::Speed { cm_per_s: Some(v) } => info!("speed: {}", tello.set_speed(v)?.trim()),
        Command::Speed { cm_per_s: None } => info!("Speed: {:.1} cm/s", tello.speed()?),
        Command::Status => cmd_status(&mut tello)?,
        Command::Repl => cmd_repl(&mut tello)?,
    }

    tello.close();
    Ok(())
}

/// Start from the config file (or defaults) and apply command-line overrides.
fn build_config(args: &Args) -> Result<TelloConfig> {
    let mut config = match &args.config {
        Some(path) => TelloConfig::from_json_file(path)?,
        None => TelloConfig::default().with_command_timeout(Duration::from_secs_f64(
            DEFAULT_TIMEOUT_SECS,
        )),
    };

    if let Some(ip) = &args.tello_ip {
        config.tello_ip = ip.clone();
    }
    if let Some(port) = args.tello_port {
        config.tello_port = port;
    }
    if let Some(port) = args.local_port {
        config.local_port = port;
    }
    if let Some(timeout) = args.timeout {
        config.command_timeout_secs = timeout;
    }
    if let Command::Takeoff {
        settle: Some(settle),
    } = args.command
    {
        config.takeoff_settle_secs = settle;
    }

    config.validate()?;
    Ok(config)
}

// ==================== Status Command ====================

fn cmd_status(tello: &mut Tello) -> Result<()> {
    let battery = tello.battery_percent_remaining()?;
    let speed = tello.speed()?;
    let flight_time = tello.flight_time()?;

    info!(
        "Battery: {}%, speed: {:.1} cm/s, flight time: {}s",
        battery, speed, flight_time
    );
    Ok(())
}

// ==================== REPL Command ====================

fn cmd_repl(tello: &mut Tello) -> Result<()> {
    println!("Connected, in command mode");
    println!();
    println!("Tello REPL - Enter SDK commands, 'quit' to exit");
    println!("Examples: battery?, takeoff, cw 90, flip f, land");
    println!();

    let mut editor = rustyline::DefaultEditor::new()?;
    loop {
        let line = match editor.readline("tello> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(cmd);

        if cmd.eq_ignore_ascii_case("quit") || cmd.eq_ignore_ascii_case("exit") {
            println!("Bye!");
            break;
        }

        match tello.send(cmd) {
            Ok(response) => println!("{}", response.trim()),
            Err(e) => println!("Error: {e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config_file(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("tello.json");
        std::fs::write(&path, r#"{"takeoff_settle_secs": 2.5}"#).unwrap();
        path
    }

    #[test]
    fn test_settle_from_config_file_survives_takeoff() {
        let dir = std::env::temp_dir().join(format!("tello_tool_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = config_file(&dir);
        let path = path.to_str().unwrap();

        let args = Args::try_parse_from(["tello_tool", "--config", path, "takeoff"]).unwrap();
        let config = build_config(&args).unwrap();
        assert_relative_eq!(config.takeoff_settle_secs, 2.5);

        let args =
            Args::try_parse_from(["tello_tool", "--config", path, "takeoff", "--settle", "1"])
                .unwrap();
        let config = build_config(&args).unwrap();
        assert_relative_eq!(config.takeoff_settle_secs, 1.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_repl_uses_default_timeout() {
        let args = Args::try_parse_from(["tello_tool", "repl"]).unwrap();
        assert!(matches!(args.command, Command::Repl));
        assert_eq!(
            build_config(&args).unwrap().command_timeout(),
            Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS)
        );
    }
}
