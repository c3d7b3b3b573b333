//! The bootstrap handshake and the armed queue handle.

use core::{fmt, hint::spin_loop};

use msgring::{Consumer, Producer, Ring};

use crate::{
    config::{QUEUE_DEPTH, REGISTER_FLAG, REGISTER_MAGIC},
    driver::{CommandFrame, SignalDriver},
    error::ConfigError,
    link::Link,
    message::Message,
    reserve::Endpoint,
    translate::AddrParams,
};

/// A duplex message queue, armed and bound to one pair of signal lines for
/// the life of the system.
///
/// Only [`MessageQueue::attach`] can construct one: holding a value of this
/// type *is* the terminal state of the bootstrap handshake. The ring
/// references inside never rebind.
pub struct MessageQueue<D: SignalDriver> {
    /// Producing half over the locally-owned ring.
    producer: Producer<'static, Message, QUEUE_DEPTH>,
    /// Consuming half over the peer's ring.
    consumer: Consumer<'static, Message, QUEUE_DEPTH>,
    notify_mask: u32,
    link: Link,
    #[cfg_attr(not(feature = "msg-address"), allow(dead_code))]
    params: AddrParams,
    driver: D,
}

impl<D: SignalDriver> fmt::Debug for MessageQueue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("link", &self.link)
            .field("notify_mask", &self.notify_mask)
            .finish_non_exhaustive()
    }
}

impl<D: SignalDriver> MessageQueue<D> {
    /// Run the one-time bootstrap handshake and arm a queue.
    ///
    /// Both cores must call this at matching call sites with mirrored line
    /// arguments: this side's `local_line` is the peer's `remote_line` and
    /// vice versa. The call blocks with no timeout until the peer shows up -
    /// a peer that never registers stalls this core by design.
    ///
    /// Every error is a fatal configuration defect; the platform should
    /// halt on one rather than continue.
    #[tracing::instrument(level = "debug", skip(driver, endpoint), err(Display))]
    pub fn attach<const LINES: usize, const SLOTS: usize>(
        driver: D,
        link: Link,
        endpoint: &'static Endpoint<LINES, SLOTS>,
        local_line: u16,
        remote_line: u16,
    ) -> Result<Self, ConfigError> {
        debug_assert_eq!(LINES as u16, link.line_count());

        // The local line is validated by the reservation below; the remote
        // line feeds the notify-mask shift and must be checked here.
        if remote_line >= link.line_count() {
            return Err(ConfigError::LineOutOfRange { line: remote_line });
        }

        let (slot, put) = endpoint.reserve(local_line)?;
        tracing::debug!(slot, "local ring allocated");

        driver.send_command(
            link,
            REGISTER_FLAG,
            local_line,
            CommandFrame {
                command: REGISTER_MAGIC,
                pointer: put as *const Ring<Message, QUEUE_DEPTH> as usize,
                data: local_line as u32,
            },
        );

        driver.wait_for_flag(link, REGISTER_FLAG);
        let frame = driver.read_command(link, REGISTER_FLAG);

        // The cores must configure matching queues at matching times.
        if frame.command != REGISTER_MAGIC {
            return Err(ConfigError::BadMagic { got: frame.command });
        }
        // Each side must expect the line the other side actually used.
        if frame.data != remote_line as u32 {
            return Err(ConfigError::LineMismatch {
                expected: remote_line,
                got: frame.data as u16,
            });
        }

        let get = frame.pointer as *const Ring<Message, QUEUE_DEPTH>;
        let notify_mask = 1u32 << remote_line;

        // Either side may be restarting independently; both rings return to
        // the empty state before the final rendezvous arms them.
        //
        // Safety: the queue is not armed yet - the producer and consumer
        // handles over `put` are only built below, and the reservation
        // table guarantees no earlier handles exist.
        unsafe { put.reset() };

        driver.ack_flag(link, REGISTER_FLAG);
        driver.wait_for_ack(link, REGISTER_FLAG);

        tracing::debug!(
            peer_ring = frame.pointer,
            notify_mask,
            "queue armed"
        );

        // Safety: `put` is a static ring this core owns; `get` is the
        // address the peer published for its own static ring, vouched for
        // by the magic check, and lives for the rest of execution. The
        // reservation table guarantees no other handle exists over either.
        let (producer, consumer) = unsafe {
            (
                Ring::producer(put as *const _, get),
                Ring::consumer(put as *const _, get),
            )
        };

        Ok(Self {
            producer,
            consumer,
            notify_mask,
            link,
            params: link.addr_params(),
            driver,
        })
    }

    /// Enqueue `msg` without blocking.
    ///
    /// Returns the message back untranslated if the queue is full, with no
    /// side effect. On success the peer's notify flag is raised as a wake
    /// hint.
    pub fn try_send(&self, msg: Message, translate: bool) -> Result<(), Message> {
        if self.producer.is_full() {
            return Err(msg);
        }
        // Cannot reject here: this side is the only producer, so fullness
        // only ever recedes between the check and the enqueue.
        if self
            .producer
            .enqueue(self.correct_outbound(msg, translate))
            .is_err()
        {
            return Err(msg);
        }
        self.driver.set_notify(self.link, self.notify_mask);
        Ok(())
    }

    /// Enqueue `msg`, spinning until a slot frees.
    pub fn send(&self, msg: Message, translate: bool) {
        let mut msg = msg;
        loop {
            match self.try_send(msg, translate) {
                Ok(()) => return,
                Err(back) => {
                    msg = back;
                    spin_loop();
                }
            }
        }
    }

    /// Dequeue one message without blocking; `None` if the queue is empty.
    pub fn try_recv(&self, translate: bool) -> Option<Message> {
        let msg = self.consumer.dequeue()?;
        Some(self.correct_inbound(msg, translate))
    }

    /// Dequeue one message, spinning until one arrives.
    pub fn recv(&self, translate: bool) -> Message {
        loop {
            if let Some(msg) = self.try_recv(translate) {
                return msg;
            }
            spin_loop();
        }
    }

    /// Messages currently waiting to be received.
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn notify_mask(&self) -> u32 {
        self.notify_mask
    }

    #[cfg(feature = "msg-address")]
    fn correct_outbound(&self, mut msg: Message, translate: bool) -> Message {
        if translate {
            msg.address = crate::translate::outbound(msg.address, self.params);
        }
        msg
    }

    #[cfg(not(feature = "msg-address"))]
    fn correct_outbound(&self, msg: Message, _translate: bool) -> Message {
        msg
    }

    #[cfg(feature = "msg-address")]
    fn correct_inbound(&self, mut msg: Message, translate: bool) -> Message {
        if translate {
            msg.address = crate::translate::inbound(msg.address, self.params);
        }
        msg
    }

    #[cfg(not(feature = "msg-address"))]
    fn correct_inbound(&self, msg: Message, _translate: bool) -> Message {
        msg
    }
}
