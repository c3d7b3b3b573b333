//! Address correction between the two cores' views of shared memory.
//!
//! The cores may address the same physical region at different numeric
//! values: a different mapping base, or a different addressing granularity
//! (16-bit word addresses on one side, byte addresses on the other). A
//! per-link [`AddrParams`] captures both. Only the address field of a
//! message is ever corrected, and only when the caller asks for it.

use serde::{Deserialize, Serialize};

/// Per-link address-correction parameters.
///
/// `scale` is doubled relative to the granularity ratio so that a ratio of
/// one (same granularity both sides) is representable as `scale == 2`; the
/// correction formulas divide by two after scaling. `scale == 1` halves an
/// address (word-addressed peer), `scale == 4` doubles it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct AddrParams {
    /// Base of the peer-to-local region, in local addressing terms.
    pub remote_base: usize,
    /// Granularity correction, times two.
    pub scale: usize,
}

/// Correct a local address for the peer's view before it is published.
#[inline]
pub const fn outbound(addr: usize, params: AddrParams) -> usize {
    (addr * params.scale) / 2
}

/// Correct a peer-published address into the local view after the copy out.
#[inline]
pub const fn inbound(addr: usize, params: AddrParams) -> usize {
    params.remote_base + (addr * params.scale) / 2
}
