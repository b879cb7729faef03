//! Crossing pipeline
//!
//! Single owner of the topology snapshot, the cursor trace and the
//! suppression flag. All methods run on the dispatcher thread, strictly
//! serialized with respect to each other, so no locking is needed.

use crate::geometry::{find_exit_edge, remap_across, Point};
use crate::platform::Desktop;
use crate::topology::{MonitorId, Topology};

/// Last-known cursor state: the monitor it was on and where it was.
/// Both pieces are always present together; a topology change drops them.
#[derive(Debug, Clone, Copy)]
struct CursorTrace {
    monitor: MonitorId,
    pos: Point,
}

/// What the hook should do with the original OS event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward the event to the rest of the hook chain unchanged.
    PassThrough,
    /// Swallow the event; a corrected position has been issued instead.
    Suppress,
}

/// The crossing engine.
pub struct CrossingPipeline {
    topology: Topology,
    trace: Option<CursorTrace>,
    /// True only while the synthetic cursor move issued below is in flight.
    suppressing: bool,
}

impl CrossingPipeline {
    pub fn new() -> Self {
        Self {
            topology: Topology::new(),
            trace: None,
            suppressing: false,
        }
    }

    pub fn monitor_count(&self) -> usize {
        self.topology.len()
    }

    /// Re-enumerates the monitors and swaps the snapshot if the arrangement
    /// changed. The cursor trace is dropped on change: it may refer to a
    /// handle that no longer exists. Returns whether anything changed.
    pub fn refresh_topology(&mut self, desktop: &dyn Desktop) -> bool {
        let fresh = desktop.enumerate();
        if self.topology.replace_if_changed(fresh) {
            self.trace = None;
            tracing::info!(
                monitors = self.topology.len(),
                "monitor topology refreshed"
            );
            true
        } else {
            false
        }
    }

    /// Processes one observed mouse-move event.
    pub fn on_mouse_move(
        &mut self,
        desktop: &mut dyn Desktop,
        pt: Point,
        injected: bool,
    ) -> Disposition {
        // Events synthesized through the cursor-move API (ours included) are
        // marked by the OS; never remap them.
        if injected {
            tracing::trace!(x = pt.x, y = pt.y, "skipping injected event");
            return Disposition::PassThrough;
        }
        // Secondary guard for drivers that deliver our own synthetic move
        // without the injected mark while it is still in flight.
        if self.suppressing {
            return Disposition::PassThrough;
        }

        let Some(cur) = desktop.monitor_at(pt) else {
            // Between monitors in the virtual desktop; leave the trace alone.
            tracing::trace!(x = pt.x, y = pt.y, "no monitor under point");
            return Disposition::PassThrough;
        };

        if let Some(trace) = self.trace {
            if trace.monitor != cur {
                if let Some(disposition) = self.handle_crossing(desktop, trace, cur, pt) {
                    return disposition;
                }
            }
        }

        self.trace = Some(CursorTrace { monitor: cur, pos: pt });
        Disposition::PassThrough
    }

    /// A crossing candidate: the cursor was on one monitor and is now on
    /// another. Returns `Some(Suppress)` when a corrected position was
    /// issued; `None` means the event should fall through to the normal
    /// trace update.
    fn handle_crossing(
        &mut self,
        desktop: &mut dyn Desktop,
        trace: CursorTrace,
        cur: MonitorId,
        pt: Point,
    ) -> Option<Disposition> {
        let (Some(src), Some(dst)) = (self.topology.find(trace.monitor), self.topology.find(cur))
        else {
            // The monitor vanished between enumeration and use.
            tracing::debug!("crossing monitor not in current topology");
            return None;
        };

        let hit = find_exit_edge(trace.pos, pt, &src.rect)?;
        tracing::debug!(
            edge = ?hit.edge,
            t = hit.t,
            along = hit.along,
            "crossing detected"
        );

        let mapped = remap_across(&src.rect, &dst.rect, hit.edge, hit.along)?;
        if mapped == pt {
            return None;
        }

        // The move below may re-enter the hook synchronously; the flag must
        // be down again before this call returns.
        self.suppressing = true;
        let moved = desktop.warp_cursor(mapped);
        self.suppressing = false;

        match moved {
            Ok(()) => {
                let monitor = desktop.monitor_at(mapped).unwrap_or(cur);
                self.trace = Some(CursorTrace {
                    monitor,
                    pos: mapped,
                });
                tracing::debug!(x = mapped.x, y = mapped.y, "cursor remapped");
                Some(Disposition::Suppress)
            }
            Err(e) => {
                // Missed correction; the raw event still updates the trace so
                // the next crossing starts from honest state.
                tracing::warn!("synthetic cursor move failed: {e}");
                None
            }
        }
    }
}

impl Default for CrossingPipeline {
    fn default() -> Self {
        Self::new()
    }
}
