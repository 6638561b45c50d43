//! Integration tests for the sender window and receiver sequencer.
//!
//! Every test steps the state machines by hand against a [`Recorder`], so
//! each call's outward effects (packets, deliveries, timer requests) can be
//! inspected directly.

use arq_window::packet::{Message, Packet};
use arq_window::services::{Call, EntityId, Recorder};
use arq_window::timer::RTT;
use arq_window::{AckOutcome, Receiver, RecvOutcome, Sender, SubmitError, SEQ_SPACE, WINDOW_SIZE};

fn msg(i: usize) -> Message {
    Message::filled(b'a' + (i % 26) as u8)
}

fn submit_n(sender: &mut Sender, rec: &mut Recorder, n: usize) {
    for i in 0..n {
        sender.submit(&msg(i), rec).expect("window has room");
    }
}

// ---------------------------------------------------------------------------
// Scenario A: window fills at WINDOW_SIZE
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_window_full_rejects_seventh() {
    let mut rec = Recorder::new();
    let mut s = Sender::new();

    submit_n(&mut s, &mut rec, 6);
    assert_eq!(s.in_flight(), 6);
    assert_eq!(s.next_seqnum(), 6);

    assert_eq!(s.submit(&msg(6), &mut rec), Err(SubmitError::WindowFull));
    assert_eq!(s.stats().window_full, 1);
    assert_eq!(s.in_flight(), WINDOW_SIZE);
    assert_eq!(s.next_seqnum(), 6, "rejected message must not consume a seqnum");
}

// ---------------------------------------------------------------------------
// Scenario B: receiver delivers once, re-ACKs duplicates
// ---------------------------------------------------------------------------

#[test]
fn scenario_b_duplicate_is_reacked_not_redelivered() {
    let mut rec = Recorder::new();
    let mut r = Receiver::new();
    let pkt = Packet::data(0, &msg(0));

    assert_eq!(r.on_packet(&pkt, &mut rec), RecvOutcome::Delivered(0));
    assert_eq!(r.expected_seqnum(), 1);
    assert_eq!(rec.delivered(), vec![msg(0).data]);

    assert_eq!(r.on_packet(&pkt, &mut rec), RecvOutcome::Duplicate { acked: 0 });
    assert_eq!(rec.delivered().len(), 1);

    let acks: Vec<i32> = rec.sent().iter().map(|p| p.acknum).collect();
    assert_eq!(acks, vec![0, 0]);
}

// ---------------------------------------------------------------------------
// Scenario C: cumulative ACK releases older packets and restarts the timer
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_partial_ack_slides_window() {
    let mut rec = Recorder::new();
    let mut s = Sender::new();
    submit_n(&mut s, &mut rec, 3);
    let first_before = s.first_slot();
    rec.clear();

    assert_eq!(s.on_ack(&Packet::ack(0, 1), &mut rec), AckOutcome::Advanced(2));
    assert_eq!(s.in_flight(), 1);
    assert_eq!(s.first_slot(), first_before + 2);
    assert_eq!(s.outstanding().map(|p| p.seqnum).collect::<Vec<_>>(), vec![2]);
    assert_eq!(
        rec.calls,
        vec![Call::StopTimer(EntityId::A), Call::StartTimer(EntityId::A, RTT)]
    );
    assert!(s.timer_armed());
}

// ---------------------------------------------------------------------------
// Scenario D: timeout resends the whole window in order
// ---------------------------------------------------------------------------

#[test]
fn scenario_d_timeout_resends_everything() {
    let mut rec = Recorder::new();
    let mut s = Sender::new();
    submit_n(&mut s, &mut rec, 3);
    let originals = rec.sent();
    rec.clear();

    assert_eq!(s.on_timeout(&mut rec), 3);
    assert_eq!(rec.sent(), originals);
    assert_eq!(s.stats().packets_resent, 3);
    assert_eq!(rec.calls.last(), Some(&Call::StartTimer(EntityId::A, RTT)));
    assert!(s.timer_armed());

    // A second expiry repeats the same blanket resend.
    rec.clear();
    assert_eq!(s.on_timeout(&mut rec), 3);
    assert_eq!(s.stats().packets_resent, 6);
}

// ---------------------------------------------------------------------------
// Scenario E: sequence numbers wrap on both sides
// ---------------------------------------------------------------------------

#[test]
fn scenario_e_sequence_numbers_wrap() {
    let mut to_b = Recorder::new();
    let mut to_a = Recorder::new();
    let mut s = Sender::new();
    let mut r = Receiver::new();

    let total = SEQ_SPACE as usize + 3;
    for i in 0..total {
        let seq = s.submit(&msg(i), &mut to_b).unwrap();
        assert_eq!(seq, (i as i32) % SEQ_SPACE);

        let data = *to_b.sent().last().unwrap();
        assert_eq!(r.on_packet(&data, &mut to_a), RecvOutcome::Delivered(seq));
        let ack = *to_a.sent().last().unwrap();
        assert_eq!(s.on_ack(&ack, &mut to_b), AckOutcome::Advanced(1));
    }

    assert_eq!(s.next_seqnum(), 3);
    assert_eq!(r.expected_seqnum(), 3);
    assert_eq!(s.in_flight(), 0);
    assert!(!s.timer_armed());
    let expected: Vec<_> = (0..total).map(|i| msg(i).data).collect();
    assert_eq!(to_a.delivered(), expected);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn corrupted_packets_leave_state_unchanged() {
    let mut rec = Recorder::new();
    let mut s = Sender::new();
    let mut r = Receiver::new();
    submit_n(&mut s, &mut rec, 4);
    rec.clear();

    let mut bad_ack = Packet::ack(0, 2);
    bad_ack.payload[5] ^= 0x40;
    let mut bad_data = Packet::data(0, &msg(0));
    bad_data.seqnum = 3;

    assert_eq!(s.on_ack(&bad_ack, &mut rec), AckOutcome::Corrupted);
    assert_eq!(r.on_packet(&bad_data, &mut rec), RecvOutcome::Corrupted);

    assert_eq!(s.in_flight(), 4);
    assert_eq!(r.expected_seqnum(), 0);
    assert!(rec.calls.is_empty());
}

#[test]
fn emitted_packets_match_accepted_submissions() {
    let mut rec = Recorder::new();
    let mut s = Sender::new();
    let mut accepted = 0;

    for i in 0..20 {
        if s.submit(&msg(i), &mut rec).is_ok() {
            accepted += 1;
        }
        assert!(s.in_flight() <= WINDOW_SIZE);
        if i % 4 == 3 {
            let oldest = s.outstanding().next().unwrap().seqnum;
            s.on_ack(&Packet::ack(0, oldest), &mut rec);
        }
    }

    assert_eq!(rec.sent().len(), accepted);
    assert_eq!(s.stats().packets_sent as usize + s.stats().window_full as usize, 20);
}

#[test]
fn repeated_out_of_order_packet_is_idempotent() {
    let mut rec = Recorder::new();
    let mut r = Receiver::new();
    r.on_packet(&Packet::data(0, &msg(0)), &mut rec);
    rec.clear();

    let early = Packet::data(3, &msg(3));
    let first = r.on_packet(&early, &mut rec);
    let second = r.on_packet(&early, &mut rec);

    assert_eq!(first, second);
    let acks = rec.sent();
    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0].acknum, acks[1].acknum);
    assert_eq!(r.expected_seqnum(), 1);
}

#[test]
fn timer_is_armed_exactly_while_packets_are_outstanding() {
    let mut rec = Recorder::new();
    let mut s = Sender::new();

    assert!(!s.timer_armed());
    submit_n(&mut s, &mut rec, 2);
    assert!(s.timer_armed());
    s.on_ack(&Packet::ack(0, 0), &mut rec);
    assert!(s.timer_armed());
    s.on_ack(&Packet::ack(0, 0), &mut rec); // duplicate
    assert!(s.timer_armed());
    s.on_ack(&Packet::ack(0, 1), &mut rec);
    assert!(!s.timer_armed());

    // No stray timer requests: starts and stops alternate.
    let timer_calls: Vec<bool> = rec
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::StartTimer(..) => Some(true),
            Call::StopTimer(..) => Some(false),
            _ => None,
        })
        .collect();
    assert!(timer_calls.windows(2).all(|w| w[0] != w[1]));
    assert_eq!(timer_calls.first(), Some(&true));
    assert_eq!(timer_calls.last(), Some(&false));
}

#[test]
fn lost_ack_is_recovered_by_a_later_cumulative_ack() {
    let mut to_b = Recorder::new();
    let mut to_a = Recorder::new();
    let mut s = Sender::new();
    let mut r = Receiver::new();

    submit_n(&mut s, &mut to_b, 3);
    for pkt in to_b.sent() {
        r.on_packet(&pkt, &mut to_a);
    }
    // ACKs 0 and 1 vanish; ACK 2 alone empties the window.
    let last_ack = to_a.sent()[2];
    assert_eq!(s.on_ack(&last_ack, &mut to_b), AckOutcome::Advanced(3));
    assert_eq!(s.in_flight(), 0);
}

#[test]
fn go_back_n_recovers_from_a_lost_packet() {
    let mut to_b = Recorder::new();
    let mut to_a = Recorder::new();
    let mut s = Sender::new();
    let mut r = Receiver::new();

    submit_n(&mut s, &mut to_b, 4);
    let sent = to_b.sent();
    // seq 1 is lost; 0, 2, 3 arrive.
    for pkt in [sent[0], sent[2], sent[3]] {
        r.on_packet(&pkt, &mut to_a);
    }
    for ack in to_a.sent() {
        s.on_ack(&ack, &mut to_b);
    }
    assert_eq!(s.in_flight(), 3);

    to_b.clear();
    to_a.clear();
    s.on_timeout(&mut to_b);
    for pkt in to_b.sent() {
        r.on_packet(&pkt, &mut to_a);
    }
    for ack in to_a.sent() {
        s.on_ack(&ack, &mut to_b);
    }

    assert_eq!(s.in_flight(), 0);
    assert_eq!(r.expected_seqnum(), 4);
    assert_eq!(r.stats().packets_delivered, 4);
}
