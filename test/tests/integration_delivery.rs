/// Integration tests for the delivery protocol between two endpoints
/// These tests drive devices and sequencers together the way a host would

use postbox_shared::{Ledger, Message, MsgNum, PeerId, PeerMailboxData};
use postbox_test::{
    assert_delivered, assert_pruned_through, exchange_until_quiet, tick_and_exchange, Endpoint,
    Link, LinkConditionerConfig,
};

fn num(value: u64) -> MsgNum {
    MsgNum::new(value).unwrap()
}

fn msg(value: u64, body: &str) -> Message {
    Message::new(num(value), body)
}

fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn connected_pair() -> (Endpoint, Endpoint) {
    let mut alice = Endpoint::new("alice");
    let mut bob = Endpoint::new("bob");
    alice.connect(&bob.name);
    bob.connect(&alice.name);
    (alice, bob)
}

/// Ledger export after add/add/setAcknum matches the checkpoint shape
#[test]
fn ledger_export_scenario() {
    let peer = PeerId::from("peer1");
    let mut ledger = Ledger::new();
    ledger.add(&peer, num(2), "data2");
    ledger.add(&peer, num(3), "data3");
    ledger.set_acknum(&peer, num(13));

    let data = ledger.export_to_data();
    assert_eq!(data.len(), 1);
    assert_eq!(
        data[&peer],
        PeerMailboxData {
            ack: num(13),
            outbox: vec![(num(2), "data2".into()), (num(3), "data3".into())],
        }
    );
    assert_eq!(
        postbox_shared::checkpoint::to_json(&data).unwrap(),
        r#"{"peer1":{"ack":13,"outbox":[[2,"data2"],[3,"data3"]]}}"#
    );
}

/// Repeating an identical delivery surfaces nothing new
#[test]
fn repeated_delivery_is_idempotent() {
    init_logging();
    let peer = PeerId::from("peer1");
    let mut endpoint = Endpoint::new("local");
    endpoint.connect(&peer);

    let batch = [msg(1, "msg1"), msg(2, "msg2")];
    assert!(endpoint.receive(&peer, &batch, MsgNum::ZERO).unwrap());
    let after_first = endpoint.device.export_to_data();

    let second = endpoint.receive(&peer, &batch, MsgNum::ZERO).unwrap();
    assert!(!second);
    assert_eq!(endpoint.device.export_to_data(), after_first);
    assert_delivered!(endpoint, &peer, ["msg1", "msg2"]);
}

/// Duplicates interleaved among new messages never break ordering
#[test]
fn ordering_survives_interleaved_duplicates() {
    let peer = PeerId::from("p");
    let mut endpoint = Endpoint::new("local");
    endpoint.connect(&peer);

    endpoint.receive(&peer, &[msg(1, "1"), msg(2, "2")], MsgNum::ZERO).unwrap();
    endpoint
        .receive(
            &peer,
            &[msg(2, "2"), msg(3, "3"), msg(1, "1"), msg(4, "4"), msg(3, "3")],
            MsgNum::ZERO,
        )
        .unwrap();
    endpoint.receive(&peer, &[msg(4, "4"), msg(5, "5")], MsgNum::ZERO).unwrap();

    assert_delivered!(endpoint, &peer, ["1", "2", "3", "4", "5"]);
    assert_eq!(endpoint.device.ledger().ack(&peer), num(5));
}

/// The ack exported to a peer never moves backwards under the sequencer
#[test]
fn exported_ack_is_monotonic() {
    let peer = PeerId::from("p");
    let mut endpoint = Endpoint::new("local");
    endpoint.connect(&peer);

    let deliveries: [&[Message]; 4] = [
        &[msg(1, "a"), msg(2, "b")],
        &[msg(1, "a")],
        &[],
        &[msg(2, "b"), msg(3, "c")],
    ];
    let mut last = MsgNum::ZERO;
    for batch in deliveries {
        endpoint.receive(&peer, batch, MsgNum::ZERO).unwrap();
        let ack = endpoint.device.ledger().ack(&peer);
        assert!(ack >= last, "ack went from {} to {}", last, ack);
        last = ack;
    }
    assert_eq!(last, num(3));
}

/// An ack-only delivery is enough to prune
#[test]
fn ack_only_delivery_converges() {
    let (mut alice, bob) = connected_pair();
    for body in ["x", "y", "z"] {
        alice.send(&bob.name, body);
    }

    assert!(alice.receive(&bob.name, &[], num(2)).unwrap());
    assert_pruned_through!(alice, &bob.name, 2);
    let (pending, _) = alice.outbound_for(&bob.name);
    assert_eq!(pending, vec![msg(3, "z")]);
}

/// Pruning holds for any ack, including one past everything sent
#[test]
fn pruning_covers_ack() {
    let (mut alice, bob) = connected_pair();
    for i in 0..5 {
        alice.send(&bob.name, &format!("m{}", i));
    }

    alice.receive(&bob.name, &[], num(3)).unwrap();
    assert_pruned_through!(alice, &bob.name, 3);
    alice.receive(&bob.name, &[], num(100)).unwrap();
    assert_pruned_through!(alice, &bob.name, 100);
    assert!(alice.outbound_for(&bob.name).0.is_empty());
}

/// A full conversation over a perfect link drains both outboxes
#[test]
fn conversation_over_perfect_link() {
    init_logging();
    let (mut alice, mut bob) = connected_pair();
    let mut link = Link::perfect();

    alice.send(&bob.name, "hello");
    alice.send(&bob.name, "how are you");
    bob.send(&alice.name, "hi");

    assert!(tick_and_exchange(&mut alice, &mut bob, &mut link).unwrap());
    exchange_until_quiet(&mut alice, &mut bob, &mut link, 10).unwrap();

    assert_delivered!(bob, &alice.name, ["hello", "how are you"]);
    assert_delivered!(alice, &bob.name, ["hi"]);
    assert!(alice.outbound_for(&bob.name).0.is_empty());
    assert!(bob.outbound_for(&alice.name).0.is_empty());
    assert_eq!(alice.device.ledger().ack(&bob.name), num(1));
    assert_eq!(bob.device.ledger().ack(&alice.name), num(2));
}

/// Sending keeps pipelining while earlier messages are unacknowledged
#[test]
fn pipelined_sends_over_lossy_link() {
    let (mut alice, mut bob) = connected_pair();
    let mut link = Link::new(LinkConditionerConfig::poor_condition(), 7);

    let mut expected = Vec::new();
    for round in 0..20 {
        let body = format!("update {}", round);
        alice.send(&bob.name, &body);
        expected.push(body);
        tick_and_exchange(&mut alice, &mut bob, &mut link).unwrap();
    }
    let ticks = exchange_until_quiet(&mut alice, &mut bob, &mut link, 500).unwrap();
    assert!(ticks < 500, "link never went quiet");

    assert_delivered!(bob, &alice.name, expected);
    assert!(alice.outbound_for(&bob.name).0.is_empty());
}

/// Peers persist in the ledger once their outbox is empty
#[test]
fn retired_peer_stays_in_ledger() {
    let (mut alice, bob) = connected_pair();
    alice.send(&bob.name, "last words");
    alice.receive(&bob.name, &[], num(1)).unwrap();

    let data = alice.device.export_to_data();
    let entry = data.get(&bob.name).expect("peer should persist");
    assert!(entry.outbox.is_empty());
}

/// Hosts can persist just the peers touched since their last commit
#[test]
fn changed_peers_track_deliveries() {
    let carol = PeerId::from("carol");
    let (mut alice, bob) = connected_pair();
    alice.connect(&carol);
    alice.send(&bob.name, "one");
    assert_eq!(alice.device.take_changed_peers(), vec![bob.name.clone()]);

    alice.receive(&carol, &[msg(1, "hey")], MsgNum::ZERO).unwrap();
    assert_eq!(alice.device.take_changed_peers(), vec![carol.clone()]);
    assert_eq!(
        postbox_shared::checkpoint::storage_key(&carol),
        "mailbox.carol"
    );
}
