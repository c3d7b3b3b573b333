//! Slot reservation: binding signal lines to ring memory.
//!
//! Each core carries one [`Endpoint`] per link category: a bank of rings in
//! the core's shared-memory region plus the [`ReservationTable`] that hands
//! the rings out. Reservations are one-way - there is no release operation,
//! so a category supports at most as many simultaneous queues as it has
//! rings, for the lifetime of the system. That is a feature: queues are
//! wired at startup and never torn down.

use msgring::Ring;
use portable_atomic::{
    AtomicU16,
    Ordering::{Acquire, Release},
};

use crate::{
    config::{
        COMPANION_LINES, COMPANION_QUEUES, CORE_LINES, CORE_QUEUES, QUEUE_DEPTH,
    },
    error::ConfigError,
    message::Message,
};

/// Sentinel for a line with no queue bound to it.
const UNBOUND: u16 = 0xFFFF;

/// Records which signal lines have been bound to which ring slots.
///
/// Slot indices are assigned in registration order and never reused: the
/// slot for a new binding is the count of lines already bound at the time
/// of the call. Registration calls within one category are serialized by
/// the handshake rendezvous, never concurrent.
pub struct ReservationTable<const LINES: usize, const SLOTS: usize> {
    entries: [AtomicU16; LINES],
}

impl<const LINES: usize, const SLOTS: usize> ReservationTable<LINES, SLOTS> {
    pub const fn new() -> Self {
        const INIT: AtomicU16 = AtomicU16::new(UNBOUND);
        Self {
            entries: [INIT; LINES],
        }
    }

    /// Bind `line` to the next free ring slot.
    ///
    /// Every failure here is a deployment defect, not a runtime condition;
    /// see [`ConfigError`].
    pub fn reserve(&self, line: u16) -> Result<u16, ConfigError> {
        if line as usize >= LINES {
            return Err(ConfigError::LineOutOfRange { line });
        }

        let slot = self
            .entries
            .iter()
            .filter(|e| e.load(Acquire) != UNBOUND)
            .count() as u16;

        if slot as usize >= SLOTS {
            return Err(ConfigError::SlotsExhausted);
        }
        if self.entries[line as usize].load(Acquire) != UNBOUND {
            return Err(ConfigError::LineAlreadyBound { line });
        }

        self.entries[line as usize].store(slot, Release);
        tracing::debug!(line, slot, "signal line bound to ring slot");
        Ok(slot)
    }

    /// The slot `line` is bound to, if any.
    pub fn binding(&self, line: u16) -> Option<u16> {
        match self.entries.get(line as usize)?.load(Acquire) {
            UNBOUND => None,
            slot => Some(slot),
        }
    }
}

impl<const LINES: usize, const SLOTS: usize> Default for ReservationTable<LINES, SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}

/// One core's end of a link category: ring memory plus its allocator.
///
/// Lives in static storage; on bare-metal targets the platform's linker
/// script places the statics below into the region the peer core can see.
pub struct Endpoint<const LINES: usize, const SLOTS: usize> {
    table: ReservationTable<LINES, SLOTS>,
    rings: [Ring<Message, QUEUE_DEPTH>; SLOTS],
}

impl<const LINES: usize, const SLOTS: usize> Endpoint<LINES, SLOTS> {
    pub const fn new() -> Self {
        const EMPTY_RING: Ring<Message, QUEUE_DEPTH> = Ring::new();
        Self {
            table: ReservationTable::new(),
            rings: [EMPTY_RING; SLOTS],
        }
    }

    /// Bind `line` and return the ring slot it was assigned.
    pub fn reserve(&self, line: u16) -> Result<(u16, &Ring<Message, QUEUE_DEPTH>), ConfigError> {
        let slot = self.table.reserve(line)?;
        Ok((slot, &self.rings[slot as usize]))
    }

    pub fn table(&self) -> &ReservationTable<LINES, SLOTS> {
        &self.table
    }
}

impl<const LINES: usize, const SLOTS: usize> Default for Endpoint<LINES, SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}

/// This core's end of the core-to-core link.
#[cfg_attr(target_os = "none", link_section = ".xipc.core_to_core")]
pub static CORE_TO_CORE: Endpoint<CORE_LINES, CORE_QUEUES> = Endpoint::new();

/// This core's end of the core-to-companion link.
#[cfg_attr(target_os = "none", link_section = ".xipc.core_to_companion")]
pub static CORE_TO_COMPANION: Endpoint<COMPANION_LINES, COMPANION_QUEUES> = Endpoint::new();
