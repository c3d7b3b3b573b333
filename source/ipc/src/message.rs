//! The transport unit.

use serde::{Deserialize, Serialize};

#[cfg(feature = "msg-payload")]
use crate::config::PAYLOAD_WORDS;

/// One fixed-size transport unit.
///
/// The shape is chosen per deployment with the `msg-command`,
/// `msg-address`, and `msg-payload` crate features; the fields compose.
/// Both cores must be built with the same shape - the layout is part of the
/// wire contract, which is why [`REGISTER_MAGIC`](crate::config::REGISTER_MAGIC)
/// is checked during the handshake.
///
/// Messages are always copied by value into and out of ring slots, never
/// referenced or shared.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[repr(C)]
pub struct Message {
    /// 32-bit command code.
    #[cfg(feature = "msg-command")]
    pub command: u32,

    /// A pointer-sized address, usually into the shared region. The only
    /// field address correction ever touches.
    #[cfg(feature = "msg-address")]
    pub address: usize,

    /// Fixed-length block of 16-bit payload words.
    #[cfg(feature = "msg-payload")]
    pub payload: [u16; PAYLOAD_WORDS],
}

impl Message {
    /// An all-zeroes message.
    pub const fn empty() -> Self {
        Self {
            #[cfg(feature = "msg-command")]
            command: 0,
            #[cfg(feature = "msg-address")]
            address: 0,
            #[cfg(feature = "msg-payload")]
            payload: [0; PAYLOAD_WORDS],
        }
    }

    #[cfg(feature = "msg-command")]
    pub const fn with_command(mut self, command: u32) -> Self {
        self.command = command;
        self
    }

    #[cfg(feature = "msg-address")]
    pub const fn with_address(mut self, address: usize) -> Self {
        self.address = address;
        self
    }

    #[cfg(feature = "msg-payload")]
    pub const fn with_payload(mut self, payload: [u16; PAYLOAD_WORDS]) -> Self {
        self.payload = payload;
        self
    }
}

#[cfg(all(
    test,
    feature = "msg-command",
    feature = "msg-address",
    feature = "msg-payload"
))]
mod tests {
    use super::*;

    #[test]
    fn builder_composes_fields() {
        let msg = Message::empty()
            .with_command(7)
            .with_address(0xBEEF)
            .with_payload([1, 2, 3, 4]);
        assert_eq!(msg.command, 7);
        assert_eq!(msg.address, 0xBEEF);
        assert_eq!(msg.payload, [1, 2, 3, 4]);
    }

    #[test]
    fn empty_is_default() {
        assert_eq!(Message::empty(), Message::default());
    }
}
