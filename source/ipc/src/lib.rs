//! Cross-core message queue transport.
//!
//! Two cores on the same package share a memory region but not cache
//! semantics, and cannot call into each other. This crate gives them a
//! fixed-shape, fixed-capacity message pipe:
//!
//! * each core statically owns an [`Endpoint`](reserve::Endpoint) per link
//!   category - a bank of [`msgring::Ring`]s plus the reservation table that
//!   hands ring slots out to signal lines, one-way, never reclaimed;
//! * at startup, both cores run [`MessageQueue::attach`] at matching call
//!   sites. The handshake trades ring addresses and line numbers over the
//!   designated control flag, validates that both images agree on the
//!   wiring, and arms the queue;
//! * afterwards, [`MessageQueue::send`]/[`recv`](MessageQueue::recv) (and
//!   their non-blocking `try_` forms) move [`Message`]s without ever taking
//!   a lock, optionally rewriting the address field between the two cores'
//!   views of the shared region.
//!
//! Everything that touches actual hardware signal lines is behind the
//! [`SignalDriver`] trait; the platform supplies it on target, and the
//! `tandem` crate supplies an in-process loopback for host testing.
//!
//! Configuration defects (bad line numbers, double registration, wiring
//! disagreement between the two images) surface as [`ConfigError`] during
//! the handshake and nowhere else - they are build problems, not runtime
//! conditions, and the platform is expected to halt on them. Full and empty
//! queues are ordinary results, reported by value.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod driver;
pub mod error;
pub mod link;
pub mod message;
pub mod queue;
pub mod reserve;
pub mod translate;

pub use self::{
    driver::{CommandFrame, SignalDriver},
    error::ConfigError,
    link::Link,
    message::Message,
    queue::MessageQueue,
    reserve::{Endpoint, ReservationTable},
};
