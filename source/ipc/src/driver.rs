//! Contract with the platform's signal-line driver.
//!
//! The data path of this transport is pure shared memory; the signal lines
//! are the orthogonal notification channel used to bootstrap queues and to
//! nudge a peer that may be sleeping. The low-level register poking lives
//! outside this crate: the platform implements [`SignalDriver`] for its IPC
//! block, and the `tandem` crate implements it over in-process mailboxes
//! for host testing.

use serde::{Deserialize, Serialize};

use crate::link::Link;

/// The three-word tuple carried by a control-flag transmission.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct CommandFrame {
    /// Command word; [`REGISTER_MAGIC`](crate::config::REGISTER_MAGIC)
    /// during the handshake.
    pub command: u32,
    /// A pointer-sized value, address-corrected by the driver if the link
    /// requires it.
    pub pointer: usize,
    /// A small data word; the sender's line number during the handshake.
    pub data: u32,
}

/// Hardware signal-line primitives this transport requires.
///
/// All waiting primitives block by busy-polling with no timeout: peer
/// liveness is a system-design guarantee, not something negotiated at
/// runtime.
pub trait SignalDriver {
    /// Transmit `frame` to the peer over `flag`, selecting `local_line` as
    /// the outgoing line. Fire-and-forget.
    fn send_command(&self, link: Link, flag: u32, local_line: u16, frame: CommandFrame);

    /// Block until the peer has transmitted on `flag`.
    fn wait_for_flag(&self, link: Link, flag: u32);

    /// Retrieve the last frame received on `flag`.
    fn read_command(&self, link: Link, flag: u32) -> CommandFrame;

    /// Acknowledge the peer's transmission on `flag`.
    fn ack_flag(&self, link: Link, flag: u32);

    /// Block until the peer has acknowledged our transmission on `flag`.
    fn wait_for_ack(&self, link: Link, flag: u32);

    /// Raise a wake hint to the peer. Purely advisory: correctness never
    /// depends on the peer observing it, since the peer may also poll.
    fn set_notify(&self, link: Link, mask: u32);
}
