//! Monitor topology model
//!
//! Owns the current set of monitors and detects arrangement changes through
//! a canonical signature, so a periodic re-enumeration is free when nothing
//! changed.

use crate::geometry::{Point, Rect};

/// Opaque, stable identifier for a monitor (the OS handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(isize);

impl MonitorId {
    pub fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> isize {
        self.0
    }
}

/// A monitor on the virtual desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub id: MonitorId,
    /// Bounds in physical pixels on the virtual desktop.
    pub rect: Rect,
    pub primary: bool,
    /// Stable device name, e.g. `\\.\DISPLAY1`.
    pub device: String,
}

impl Monitor {
    pub fn contains(&self, p: Point) -> bool {
        self.rect.contains(p)
    }
}

/// The current monitor arrangement.
///
/// Populated once at startup and replaced wholesale when a refresh observes
/// a different signature; readers never see a partially updated set.
#[derive(Debug, Default)]
pub struct Topology {
    monitors: Vec<Monitor>,
    signature: String,
}

/// Canonical signature of a monitor set, independent of enumeration order.
///
/// The device name participates so that two monitors with identical
/// rectangles but different identities still count as distinct topologies.
pub fn signature_of(monitors: &[Monitor]) -> String {
    let mut sorted: Vec<&Monitor> = monitors.iter().collect();
    sorted.sort_by(|a, b| {
        a.device
            .cmp(&b.device)
            .then(a.rect.left.cmp(&b.rect.left))
            .then(a.rect.top.cmp(&b.rect.top))
    });

    let mut sig = String::new();
    for m in sorted {
        sig.push_str(&format!(
            "{},{},{},{},{};{};",
            m.rect.left,
            m.rect.top,
            m.rect.right,
            m.rect.bottom,
            u8::from(m.primary),
            m.device
        ));
    }
    sig
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored set with `fresh` iff its signature differs.
    ///
    /// Returns `true` when the topology actually changed. An empty
    /// enumeration result is ignored: it would violate the non-empty
    /// invariant and in practice only occurs transiently during display
    /// driver reconfiguration.
    pub fn replace_if_changed(&mut self, fresh: Vec<Monitor>) -> bool {
        if fresh.is_empty() && !self.monitors.is_empty() {
            tracing::warn!("monitor enumeration returned no monitors; keeping previous topology");
            return false;
        }

        let sig = signature_of(&fresh);
        if sig == self.signature {
            return false;
        }

        self.monitors = fresh;
        self.signature = sig;
        true
    }

    /// Linear handle lookup; monitor counts are tiny in practice.
    pub fn find(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}
