//! Compile-time configuration surface.
//!
//! Everything here parameterizes the transport for one deployment: ring
//! depth, payload width, how many signal lines each link category exposes
//! and how many concurrent queues it has provisioned memory for, and the
//! address-correction parameters for each link. The message *shape* is
//! selected with the `msg-command` / `msg-address` / `msg-payload` crate
//! features.

use crate::translate::AddrParams;

/// Slots per ring. One slot is always kept empty, so a queue holds at most
/// `QUEUE_DEPTH - 1` messages. Pick one larger than you need.
pub const QUEUE_DEPTH: usize = 4;

/// Payload length in 16-bit words, when the `msg-payload` shape is enabled.
pub const PAYLOAD_WORDS: usize = 4;

/// Signal lines on the core-to-core link.
pub const CORE_LINES: usize = 4;
/// Concurrent queues provisioned on the core-to-core link.
pub const CORE_QUEUES: usize = 4;

/// Signal lines on the core-to-companion link.
pub const COMPANION_LINES: usize = 8;
/// Concurrent queues provisioned on the core-to-companion link. Fewer than
/// the line count: lines are cheap, ring memory is not.
pub const COMPANION_QUEUES: usize = 4;

/// Registration magic sent during the handshake. Doubles as a protocol
/// version check: a peer built against a different wire layout won't match.
pub const REGISTER_MAGIC: u32 = 0xFFFF_FF01;

/// The control flag reserved for the bootstrap handshake. Data-path notify
/// flags are derived from line numbers and never collide with it.
pub const REGISTER_FLAG: u32 = 31;

/// Address correction for the core-to-core link. Both cores address the
/// shared region identically in the default deployment, so `scale == 2`
/// makes the outbound formula the identity and `remote_base == 0` keeps the
/// inbound one symmetric.
pub const CORE_ADDR_PARAMS: AddrParams = AddrParams {
    remote_base: 0,
    scale: 2,
};

/// Address correction for the core-to-companion link.
pub const COMPANION_ADDR_PARAMS: AddrParams = AddrParams {
    remote_base: 0,
    scale: 2,
};

const _: () = assert!(
    QUEUE_DEPTH >= 2,
    "a queue depth below 2 cannot distinguish empty from full"
);

#[cfg(feature = "msg-payload")]
const _: () = assert!(
    PAYLOAD_WORDS >= 1,
    "the msg-payload shape is enabled but PAYLOAD_WORDS is zero"
);

#[cfg(not(any(
    feature = "msg-command",
    feature = "msg-address",
    feature = "msg-payload"
)))]
compile_error!(
    "at least one message shape feature must be enabled: \
     `msg-command`, `msg-address`, or `msg-payload`"
);
