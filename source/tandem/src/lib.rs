//! An in-process stand-in for the hardware signal lines.
//!
//! A [`Fabric`] models the signal fabric between two cores: for each side,
//! one mailbox per (link, flag) pair plus a pending-notification word per
//! link. [`Fabric::pair`] hands out two [`Peer`]s - one per simulated core -
//! each implementing [`SignalDriver`] by writing into the *other* side's
//! mailboxes and spinning on its own, which is exactly the shape of the
//! real driver's flag registers.
//!
//! Rendezvous bookkeeping follows the hardware's ack discipline: reading a
//! command leaves the flag raised; [`ack_flag`](SignalDriver::ack_flag)
//! lowers it and raises the ack bit, which the peer's
//! [`wait_for_ack`](SignalDriver::wait_for_ack) then consumes. That makes
//! the control flag safely reusable for registering several queues on the
//! same link, as long as both cores register them in the same order.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc, Mutex,
};
use std::thread;

use ipc::{CommandFrame, Endpoint, Link, SignalDriver};

const LINK_COUNT: usize = 2;
const FLAG_COUNT: usize = 32;

fn link_index(link: Link) -> usize {
    match link {
        Link::CoreToCore => 0,
        Link::CoreToCompanion => 1,
    }
}

#[derive(Default)]
struct Mailbox {
    frame: Mutex<Option<CommandFrame>>,
    /// Raised by the peer's `send_command`, lowered by our `ack_flag`.
    posted: AtomicBool,
    /// Raised by our `ack_flag`, consumed by the peer's `wait_for_ack`.
    acked: AtomicBool,
}

struct Side {
    mailboxes: [[Mailbox; FLAG_COUNT]; LINK_COUNT],
    notify: [AtomicU32; LINK_COUNT],
}

impl Side {
    fn new() -> Self {
        Self {
            mailboxes: std::array::from_fn(|_| std::array::from_fn(|_| Mailbox::default())),
            notify: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    fn mailbox(&self, link: Link, flag: u32) -> &Mailbox {
        &self.mailboxes[link_index(link)][flag as usize]
    }
}

/// The simulated signal fabric between two cores.
pub struct Fabric {
    sides: [Side; 2],
}

impl Fabric {
    /// Build a fabric and return a driver for each simulated core.
    pub fn pair() -> (Peer, Peer) {
        let fabric = Arc::new(Fabric {
            sides: [Side::new(), Side::new()],
        });
        (
            Peer {
                fabric: fabric.clone(),
                id: 0,
            },
            Peer { fabric, id: 1 },
        )
    }
}

/// One simulated core's view of the fabric. Implements [`SignalDriver`].
#[derive(Clone)]
pub struct Peer {
    fabric: Arc<Fabric>,
    id: usize,
}

impl Peer {
    fn mine(&self) -> &Side {
        &self.fabric.sides[self.id]
    }

    fn theirs(&self) -> &Side {
        &self.fabric.sides[1 - self.id]
    }

    /// Drain and return the notification bits raised toward this side.
    pub fn take_notifications(&self, link: Link) -> u32 {
        self.mine().notify[link_index(link)].swap(0, Ordering::AcqRel)
    }
}

impl SignalDriver for Peer {
    fn send_command(&self, link: Link, flag: u32, local_line: u16, frame: CommandFrame) {
        tracing::trace!(side = self.id, ?link, flag, local_line, ?frame, "send_command");
        let mailbox = self.theirs().mailbox(link, flag);
        *mailbox.frame.lock().expect("fabric mailbox poisoned") = Some(frame);
        mailbox.posted.store(true, Ordering::Release);
    }

    fn wait_for_flag(&self, link: Link, flag: u32) {
        let mailbox = self.mine().mailbox(link, flag);
        while !mailbox.posted.load(Ordering::Acquire) {
            thread::yield_now();
        }
    }

    fn read_command(&self, link: Link, flag: u32) -> CommandFrame {
        let mailbox = self.mine().mailbox(link, flag);
        mailbox
            .frame
            .lock()
            .expect("fabric mailbox poisoned")
            .expect("read_command before any transmission on this flag")
    }

    fn ack_flag(&self, link: Link, flag: u32) {
        let mailbox = self.mine().mailbox(link, flag);
        mailbox.posted.store(false, Ordering::Release);
        mailbox.acked.store(true, Ordering::Release);
    }

    fn wait_for_ack(&self, link: Link, flag: u32) {
        // The peer acks on its own mailbox, the one we transmitted into.
        let mailbox = self.theirs().mailbox(link, flag);
        while !mailbox.acked.swap(false, Ordering::AcqRel) {
            thread::yield_now();
        }
    }

    fn set_notify(&self, link: Link, mask: u32) {
        self.theirs().notify[link_index(link)].fetch_or(mask, Ordering::AcqRel);
    }
}

/// A fresh, private endpoint for one simulated core.
///
/// On hardware every core has its own reservation tables and ring banks in
/// static storage; in one process the crate-level statics would be shared
/// between both simulated cores, so each side leaks its own instead.
pub fn leak_endpoint<const LINES: usize, const SLOTS: usize>() -> &'static Endpoint<LINES, SLOTS> {
    Box::leak(Box::new(Endpoint::new()))
}
