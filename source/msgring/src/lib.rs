//! MsgRing - a shared-memory SPSC message ring
//!
//! A bounded ring of fixed-size messages intended to be placed in a memory
//! region that two independent cores can both see, but which only one of
//! them may write. This is the classic Lamport ring with one twist forced
//! by the hardware: a core can only store to its *own* memory region, so
//! each [`Ring`] carries both of the cursors its owner is allowed to write.
//!
//! * `write` - the owner's producer cursor into the ring's own slots
//! * `read`  - the owner's consumer cursor over the *peer's* slots
//!
//! The peer only ever loads these fields. Every cursor therefore has exactly
//! one writer for the life of the queue, which is what makes the structure
//! safe without any mutual exclusion. The producer publishes a slot by
//! storing the advanced `write` cursor *after* the slot contents are fully
//! written (`Release`), and the consumer retires a slot by storing the
//! advanced `read` cursor *after* the copy out is complete. One slot is kept
//! permanently empty so that `write == read` means "empty" and
//! `(write + 1) % N == read` means "full".

#![cfg_attr(not(test), no_std)]

use core::{cell::UnsafeCell, marker::PhantomData, mem::MaybeUninit, ptr::NonNull};
use portable_atomic::{
    AtomicU16,
    Ordering::{Acquire, Relaxed, Release},
};

struct Slot<T>(UnsafeCell<MaybeUninit<T>>);

impl<T> Slot<T> {
    const EMPTY: Self = Slot(UnsafeCell::new(MaybeUninit::uninit()));
}

/// One direction's worth of shared queue state, owned by a single core.
///
/// The backing storage for a [`Producer`]/[`Consumer`] pair. A duplex queue
/// is two `Ring`s, one in each core's memory region, bound together by
/// [`Ring::producer`] and [`Ring::consumer`].
#[repr(C)]
pub struct Ring<T, const N: usize> {
    slots: [Slot<T>; N],

    /// Producer cursor into `slots`. Written only by the owning core.
    write: AtomicU16,

    /// Consumer cursor over the *peer* ring's slots. Written only by the
    /// owning core, read by the peer to decide whether its ring is full.
    read: AtomicU16,
}

// The ring is shared with the peer core by construction; all cross-core
// traffic goes through the atomics or through slots whose ownership is
// handed over by a cursor publication.
unsafe impl<T: Send, const N: usize> Sync for Ring<T, N> {}

impl<T, const N: usize> Ring<T, N> {
    /// Create an empty ring.
    ///
    /// Usable in `static` initializers; capacities below 2 cannot represent
    /// the empty/full distinction and fail the build when evaluated in a
    /// const context.
    pub const fn new() -> Self {
        assert!(N >= 2, "ring capacity must be at least 2");
        assert!(N < u16::MAX as usize, "ring capacity must fit a u16 cursor");
        Self {
            slots: [Slot::EMPTY; N],
            write: AtomicU16::new(0),
            read: AtomicU16::new(0),
        }
    }

    /// Zero both cursors, returning the ring to the empty state.
    ///
    /// # Safety
    ///
    /// No [`Producer`] or [`Consumer`] handle may exist over this ring, on
    /// either core, when this is called. Rewinding `read` under an armed
    /// direction lets the consumer re-read slots whose contents were
    /// already moved out, duplicating ownership of a non-`Copy` `T`. The
    /// intended call site is the pre-arming rendezvous, where either side
    /// may be restarting independently.
    pub unsafe fn reset(&self) {
        self.write.store(0, Release);
        self.read.store(0, Release);
    }

    /// Current producer cursor.
    pub fn write_index(&self) -> u16 {
        self.write.load(Acquire)
    }

    /// Current consumer cursor (over the peer's slots).
    pub fn read_index(&self) -> u16 {
        self.read.load(Acquire)
    }

    /// Build the producing half of the direction that flows out of `local`.
    ///
    /// # Safety
    ///
    /// `local` and `peer` must point to live rings for the duration of `'a`,
    /// `local` must be the ring owned by the calling core, and no other
    /// `Producer` may exist over `local` at the same time.
    pub unsafe fn producer<'a>(local: *const Self, peer: *const Self) -> Producer<'a, T, N> {
        Producer {
            local: NonNull::new_unchecked(local as *mut Self),
            peer: NonNull::new_unchecked(peer as *mut Self),
            pd: PhantomData,
        }
    }

    /// Build the consuming half of the direction that flows out of `peer`.
    ///
    /// # Safety
    ///
    /// Same liveness and ownership rules as [`Ring::producer`]: `local` is
    /// the calling core's own ring (it holds the `read` cursor), and no
    /// other `Consumer` may exist over this direction at the same time.
    pub unsafe fn consumer<'a>(local: *const Self, peer: *const Self) -> Consumer<'a, T, N> {
        Consumer {
            local: NonNull::new_unchecked(local as *mut Self),
            peer: NonNull::new_unchecked(peer as *mut Self),
            pd: PhantomData,
        }
    }
}

impl<T, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The writing half of one direction. Owns the local ring's `write` cursor.
pub struct Producer<'a, T, const N: usize> {
    local: NonNull<Ring<T, N>>,
    peer: NonNull<Ring<T, N>>,
    pd: PhantomData<&'a ()>,
}

unsafe impl<'a, T: Send, const N: usize> Send for Producer<'a, T, N> {}

/// The reading half of one direction. Owns the local ring's `read` cursor.
pub struct Consumer<'a, T, const N: usize> {
    local: NonNull<Ring<T, N>>,
    peer: NonNull<Ring<T, N>>,
    pd: PhantomData<&'a ()>,
}

unsafe impl<'a, T: Send, const N: usize> Send for Consumer<'a, T, N> {}

impl<'a, T, const N: usize> Producer<'a, T, N> {
    /// Adds an `item` to the end of the queue.
    ///
    /// Returns back the `item` if the queue is full, with no side effect on
    /// cursors or slot contents. Each call re-reads the peer's consumer
    /// cursor, so callers may simply retry to block.
    pub fn enqueue(&self, item: T) -> Result<(), T> {
        let local = unsafe { self.local.as_ref() };
        let peer = unsafe { self.peer.as_ref() };

        // Own field; the peer never writes it.
        let write = local.write.load(Relaxed);
        let read = peer.read.load(Acquire);

        if (write + 1) % N as u16 == read {
            return Err(item);
        }

        unsafe {
            (*local.slots[write as usize].0.get()).write(item);
        }

        // Publish last: the peer must never observe the advanced cursor
        // before the slot contents are fully written.
        local.write.store((write + 1) % N as u16, Release);
        Ok(())
    }

    /// Whether the next [`enqueue`](Self::enqueue) would be rejected.
    pub fn is_full(&self) -> bool {
        let local = unsafe { self.local.as_ref() };
        let peer = unsafe { self.peer.as_ref() };
        let write = local.write.load(Relaxed);
        (write + 1) % N as u16 == peer.read.load(Acquire)
    }
}

impl<'a, T, const N: usize> Consumer<'a, T, N> {
    /// Returns the item at the front of the queue, or `None` if it is empty.
    ///
    /// Each call re-reads the peer's producer cursor, so callers may simply
    /// retry to block.
    pub fn dequeue(&self) -> Option<T> {
        let local = unsafe { self.local.as_ref() };
        let peer = unsafe { self.peer.as_ref() };

        let write = peer.write.load(Acquire);
        // Own field; the peer never writes it.
        let read = local.read.load(Relaxed);

        if write == read {
            return None;
        }

        let item = unsafe { (*peer.slots[read as usize].0.get()).assume_init_read() };

        // Retire after read: the peer must not be told the slot is free
        // before the copy out is complete.
        local.read.store((read + 1) % N as u16, Release);
        Some(item)
    }

    /// Whether the next [`dequeue`](Self::dequeue) would return `None`.
    pub fn is_empty(&self) -> bool {
        let local = unsafe { self.local.as_ref() };
        let peer = unsafe { self.peer.as_ref() };
        peer.write.load(Acquire) == local.read.load(Relaxed)
    }

    /// Number of items currently queued in this direction.
    pub fn len(&self) -> usize {
        let local = unsafe { self.local.as_ref() };
        let peer = unsafe { self.peer.as_ref() };
        let write = peer.write.load(Acquire) as usize;
        let read = local.read.load(Relaxed) as usize;
        (write + N - read) % N
    }
}
