//! Platform layer
//!
//! Defines the slice of the OS the core consumes and hosts the per-platform
//! implementations. Everything above this module is OS-free and fully
//! testable with a mock [`Desktop`].

use thiserror::Error;

use crate::geometry::Point;
use crate::topology::{Monitor, MonitorId};

#[cfg(windows)]
pub mod windows;

/// Errors surfaced by the platform layer.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("no monitors detected")]
    NoMonitors,

    #[error("failed to register hidden window class: {0}")]
    WindowClass(String),

    #[error("failed to create hidden window: {0}")]
    WindowCreate(String),

    #[error("failed to create topology check timer: {0}")]
    TimerCreate(String),

    #[error("failed to install mouse hook: {0}")]
    HookInstall(String),

    #[error("cursor move rejected by the OS: {0}")]
    CursorMove(String),

    #[error("not supported on this platform")]
    Unsupported,
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// The OS surface the crossing engine consumes.
pub trait Desktop {
    /// Queries the OS for the current monitor set.
    fn enumerate(&self) -> Vec<Monitor>;

    /// Returns the monitor under `point`, or `None` when the point lies in a
    /// gap of the virtual desktop.
    fn monitor_at(&self, point: Point) -> Option<MonitorId>;

    /// Moves the cursor to an absolute position.
    fn warp_cursor(&mut self, point: Point) -> PlatformResult<()>;
}

/// Runs the dispatcher until shutdown.
#[cfg(windows)]
pub fn run(pipeline: crate::hook::CrossingPipeline) -> PlatformResult<()> {
    windows::run(pipeline)
}

#[cfg(not(windows))]
pub fn run(_pipeline: crate::hook::CrossingPipeline) -> PlatformResult<()> {
    Err(PlatformError::Unsupported)
}

/// Enumerates the current monitors, for diagnostics.
#[cfg(windows)]
pub fn monitors() -> PlatformResult<Vec<Monitor>> {
    windows::monitors()
}

#[cfg(not(windows))]
pub fn monitors() -> PlatformResult<Vec<Monitor>> {
    Err(PlatformError::Unsupported)
}

/// Get the current platform name.
pub fn platform_name() -> &'static str {
    #[cfg(windows)]
    return "Windows";

    #[cfg(not(windows))]
    return "Unsupported";
}
