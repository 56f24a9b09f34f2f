//! Demo flight: take off, flip forward, land.
//!
//! Landing is attempted even if the maneuver fails.

use std::time::Duration;

use anyhow::Result;
use tello::{FlipDirection, Tello, TelloConfig};
use tracing::{error, info};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_thread_names(true)
        .init();

    info!("Starting");
    let config = TelloConfig::default().with_command_timeout(Duration::from_secs(5));
    let mut drone = Tello::open(config)?;

    let maneuver = drone
        .take_off()
        .and_then(|_| drone.flip(FlipDirection::Forward));
    if let Err(e) = maneuver {
        error!("{e}");
    }

    info!("land: {}", drone.land()?.trim());
    drone.close();
    Ok(())
}
