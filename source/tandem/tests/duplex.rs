//! Whole-transport tests: two simulated cores, real handshake, real rings.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use ipc::{
    config::{COMPANION_LINES, COMPANION_QUEUES, CORE_LINES, CORE_QUEUES, REGISTER_FLAG},
    CommandFrame, ConfigError, Link, Message, MessageQueue, SignalDriver,
};
use tandem::{Fabric, Peer};

fn trace_init() {
    use tracing_subscriber::{
        filter::{EnvFilter, LevelFilter},
        prelude::*,
    };
    let env = std::env::var("RUST_LOG").unwrap_or_default();
    let builder = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into());
    let filter = if env.is_empty() {
        builder.parse("ipc=debug").unwrap()
    } else {
        builder.parse_lossy(env)
    };

    let _res = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .finish()
        .try_init();
}

/// Arm a queue pair over the core-to-core link. Returns both armed queues
/// plus driver clones for poking at the fabric from the test body.
fn armed_core_pair(
    a_line: u16,
    b_line: u16,
) -> (MessageQueue<Peer>, MessageQueue<Peer>, Peer, Peer) {
    trace_init();
    let (pa, pb) = Fabric::pair();
    let (ca, cb) = (pa.clone(), pb.clone());
    let ea = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();
    let eb = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();

    let a = thread::spawn(move || MessageQueue::attach(pa, Link::CoreToCore, ea, a_line, b_line));
    let b = thread::spawn(move || MessageQueue::attach(pb, Link::CoreToCore, eb, b_line, a_line));

    (
        a.join().unwrap().expect("side A must arm"),
        b.join().unwrap().expect("side B must arm"),
        ca,
        cb,
    )
}

fn cmd(n: u32) -> Message {
    Message::empty()
        .with_command(n)
        .with_payload([n as u16, 0, 0, n as u16])
}

#[test]
fn handshake_symmetry_and_round_trip() {
    let (qa, qb, _ca, cb) = armed_core_pair(0, 1);

    assert_eq!(qa.notify_mask(), 1 << 1);
    assert_eq!(qb.notify_mask(), 1 << 0);

    for n in 1..=3 {
        qa.send(cmd(n), false);
    }
    // The wake hint for side B carries side B's line bit.
    assert_ne!(cb.take_notifications(Link::CoreToCore) & (1 << 1), 0);

    for n in 1..=3 {
        assert_eq!(qb.recv(false), cmd(n));
    }
    assert_eq!(qb.try_recv(false), None);
}

#[test]
fn duplex_directions_are_independent() {
    let (qa, qb, _ca, _cb) = armed_core_pair(2, 3);

    qa.send(cmd(10), false);
    qb.send(cmd(20), false);
    qb.send(cmd(21), false);

    assert_eq!(qb.pending(), 1);
    assert_eq!(qa.pending(), 2);

    assert_eq!(qb.recv(false), cmd(10));
    assert_eq!(qa.recv(false), cmd(20));
    assert_eq!(qa.recv(false), cmd(21));
}

#[test]
fn full_queue_rejects_then_drains_in_order() {
    // QUEUE_DEPTH is 4, so a queue holds exactly 3 messages.
    trace_init();
    let (pa, pb) = Fabric::pair();
    let ea = tandem::leak_endpoint::<COMPANION_LINES, COMPANION_QUEUES>();
    let eb = tandem::leak_endpoint::<COMPANION_LINES, COMPANION_QUEUES>();
    let a = thread::spawn(move || MessageQueue::attach(pa, Link::CoreToCompanion, ea, 0, 1));
    let b = thread::spawn(move || MessageQueue::attach(pb, Link::CoreToCompanion, eb, 1, 0));
    let qa = a.join().unwrap().unwrap();
    let qb = b.join().unwrap().unwrap();

    assert_eq!(qa.try_send(cmd(1), false), Ok(()));
    assert_eq!(qa.try_send(cmd(2), false), Ok(()));
    assert_eq!(qa.try_send(cmd(3), false), Ok(()));

    // Fourth send must be rejected, message returned intact.
    assert_eq!(qa.try_send(cmd(4), false), Err(cmd(4)));

    assert_eq!(qb.try_recv(false), Some(cmd(1)));
    assert_eq!(qb.try_recv(false), Some(cmd(2)));
    assert_eq!(qb.try_recv(false), Some(cmd(3)));
    assert_eq!(qb.try_recv(false), None);

    // Space freed; sending works again.
    assert_eq!(qa.try_send(cmd(5), false), Ok(()));
    assert_eq!(qb.try_recv(false), Some(cmd(5)));
}

#[test]
fn blocking_send_stalls_until_peer_dequeues() {
    static SENT: AtomicBool = AtomicBool::new(false);

    let (qa, qb, _ca, _cb) = armed_core_pair(0, 1);

    for n in 1..=3 {
        qa.send(cmd(n), false);
    }

    let sender = thread::spawn(move || {
        qa.send(cmd(4), false);
        SENT.store(true, Ordering::SeqCst);
    });

    // The fourth send must still be spinning while the queue is full.
    thread::sleep(Duration::from_millis(50));
    assert!(!SENT.load(Ordering::SeqCst), "send returned on a full queue");

    assert_eq!(qb.recv(false), cmd(1));
    sender.join().unwrap();
    assert!(SENT.load(Ordering::SeqCst));

    assert_eq!(qb.recv(false), cmd(2));
    assert_eq!(qb.recv(false), cmd(3));
    assert_eq!(qb.recv(false), cmd(4));
}

#[test]
fn address_correction_applies_only_to_the_address_field() {
    let (qa, qb, _ca, _cb) = armed_core_pair(0, 1);

    let msg = cmd(9).with_address(0x2000_1234);

    // Default link parameters are the identity correction, so a translated
    // round trip hands back the original address.
    qa.send(msg, true);
    let got = qb.recv(true);
    assert_eq!(got.address, 0x2000_1234);
    assert_eq!(got.command, 9);
    assert_eq!(got.payload, msg.payload);

    // Untranslated traffic is bit-for-bit untouched.
    qa.send(msg, false);
    assert_eq!(qb.recv(false), msg);
}

#[test]
fn several_queues_share_one_link() {
    trace_init();
    let (pa, pb) = Fabric::pair();
    let ea = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();
    let eb = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();

    // Queues register in the same order on both cores; the control flag is
    // reused sequentially.
    let mut queues = Vec::new();
    for (a_line, b_line) in [(0u16, 1u16), (2, 3)] {
        let (pa, pb) = (pa.clone(), pb.clone());
        let a =
            thread::spawn(move || MessageQueue::attach(pa, Link::CoreToCore, ea, a_line, b_line));
        let b =
            thread::spawn(move || MessageQueue::attach(pb, Link::CoreToCore, eb, b_line, a_line));
        queues.push((a.join().unwrap().unwrap(), b.join().unwrap().unwrap()));
    }

    let (qa1, qb1) = &queues[0];
    let (qa2, qb2) = &queues[1];

    qa1.send(cmd(100), false);
    qa2.send(cmd(200), false);
    qa1.send(cmd(101), false);

    // Traffic stays on its own queue.
    assert_eq!(qb2.recv(false), cmd(200));
    assert_eq!(qb2.try_recv(false), None);
    assert_eq!(qb1.recv(false), cmd(100));
    assert_eq!(qb1.recv(false), cmd(101));
}

#[test]
fn wiring_mismatch_fails_instead_of_arming() {
    trace_init();
    let (pa, pb) = Fabric::pair();
    let ea = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();
    let eb = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();

    // Side A registers on line 0 and stalls forever at the final
    // rendezvous once side B bails out; leave it detached.
    thread::spawn(move || {
        let _ = MessageQueue::attach(pa, Link::CoreToCore, ea, 0, 1);
    });

    // Side B was (mis)configured to expect the peer on line 3.
    let err = MessageQueue::attach(pb, Link::CoreToCore, eb, 1, 3).unwrap_err();
    assert_eq!(
        err,
        ConfigError::LineMismatch {
            expected: 3,
            got: 0
        }
    );
}

#[test]
fn protocol_magic_mismatch_is_fatal() {
    trace_init();
    let (pa, pb) = Fabric::pair();
    let ea = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();

    // A peer image speaking a different protocol version.
    pb.send_command(
        Link::CoreToCore,
        REGISTER_FLAG,
        1,
        CommandFrame {
            command: 0xBAD0_BAD0,
            pointer: 0,
            data: 1,
        },
    );

    let err = MessageQueue::attach(pa, Link::CoreToCore, ea, 0, 1).unwrap_err();
    assert_eq!(err, ConfigError::BadMagic { got: 0xBAD0_BAD0 });
}

#[test]
fn bad_line_number_fails_before_touching_the_fabric() {
    trace_init();
    let (pa, _pb) = Fabric::pair();
    let ea = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();

    let err = MessageQueue::attach(pa, Link::CoreToCore, ea, 9, 1).unwrap_err();
    assert_eq!(err, ConfigError::LineOutOfRange { line: 9 });
}

#[test]
fn bad_remote_line_number_is_fatal_not_a_bad_mask() {
    trace_init();
    let (pa, _pb) = Fabric::pair();
    let ea = tandem::leak_endpoint::<CORE_LINES, CORE_QUEUES>();

    // A remote line past the link's range can never carry a notify bit;
    // it must surface as the configuration defect it is, and it must not
    // consume the local line's reservation.
    let err = MessageQueue::attach(pa, Link::CoreToCore, ea, 0, 40).unwrap_err();
    assert_eq!(err, ConfigError::LineOutOfRange { line: 40 });
    assert_eq!(ea.table().binding(0), None);
}
