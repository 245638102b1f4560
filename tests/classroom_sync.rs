//! Multi-participant classroom scenarios over the in-process hub.

#[macro_use]
mod common;

use assert_matches::assert_matches;
use chessroom::board::{Arrow, Chapter, Direction, Mode, Side, START_FEN};
use chessroom::client::LocalHub;
use chessroom::shared::{ClassroomError, Participant, ParticipantId};
use common::{connect, pump, sq};
use pretty_assertions::assert_eq;

#[test]
fn test_late_joiner_receives_room_state() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    coach.join();
    assert_ok!(coach.attempt_move(sq("e2"), sq("e4"), None));
    assert_ok!(coach.attempt_move(sq("e7"), sq("e5"), None));
    coach.toggle_arrow(sq("g1"), sq("f3"));

    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));
    student.join();

    // join + sync_request
    assert_eq!(pump(&mut coach, &mut coach_rx), 2);
    assert!(coach.presence().iter().any(|p| p.id.as_str() == "s1"));

    // full position, controls, annotations
    assert_eq!(pump(&mut student, &mut student_rx), 3);
    assert_converged!(student, coach);
    assert_eq!(student.position().history(), &["e4", "e5"]);
    assert_eq!(student.annotations().arrows.len(), 1);
}

#[test]
fn test_students_do_not_answer_sync_requests() {
    let hub = LocalHub::new(64);
    let (mut first, mut first_rx) = connect(&hub, Participant::student("s1", "Sam"));
    let (mut second, _second_rx) = connect(&hub, Participant::student("s2", "Alex"));

    second.join();
    // the join is applied, the sync request is not
    assert_eq!(pump(&mut first, &mut first_rx), 1);
    assert_eq!(hub.subscriber_count(), 2);
}

#[test]
fn test_control_handoff() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut white, mut white_rx) = connect(&hub, Participant::student("s1", "Sam"));
    let (mut black, mut black_rx) = connect(&hub, Participant::student("s2", "Alex"));

    assert_ok!(coach.assign_control(Side::White, Some(ParticipantId::new("s1"))));
    assert_ok!(coach.assign_control(Side::Black, Some(ParticipantId::new("s2"))));
    pump(&mut white, &mut white_rx);
    pump(&mut black, &mut black_rx);

    // students cannot reassign
    assert_err!(
        white.assign_control(Side::Black, None),
        ClassroomError::PermissionDenied { .. }
    );

    // wrong color is rejected before the rules run
    assert_err!(
        black.attempt_move(sq("e2"), sq("e4"), None),
        ClassroomError::PermissionDenied { .. }
    );
    assert_ok!(white.attempt_move(sq("e2"), sq("e4"), None));
    pump(&mut black, &mut black_rx);
    assert_err!(
        white.attempt_move(sq("e7"), sq("e5"), None),
        ClassroomError::PermissionDenied { .. }
    );
    assert_ok!(black.attempt_move(sq("e7"), sq("e5"), None));

    pump(&mut coach, &mut coach_rx);
    pump(&mut white, &mut white_rx);
    assert_converged!(coach, white);
    assert_converged!(coach, black);
    assert_eq!(coach.position().history(), &["e4", "e5"]);
}

#[test]
fn test_released_control_is_unrestricted() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_ok!(coach.toggle_control(Side::White, ParticipantId::new("c1")));
    pump(&mut student, &mut student_rx);
    assert_err!(
        student.attempt_move(sq("d2"), sq("d4"), None),
        ClassroomError::PermissionDenied { .. }
    );

    // toggling the same holder releases the side
    assert_ok!(coach.toggle_control(Side::White, ParticipantId::new("c1")));
    pump(&mut student, &mut student_rx);
    assert!(student.controls().holder(Side::White).is_none());
    assert_ok!(student.attempt_move(sq("d2"), sq("d4"), None));
}

#[test]
fn test_illegal_move_is_not_broadcast() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_err!(
        coach.attempt_move(sq("e2"), sq("e5"), None),
        ClassroomError::IllegalMove { .. }
    );
    assert_eq!(pump(&mut student, &mut student_rx), 0);
    assert_eq!(coach.position().fen(), START_FEN);
}

#[test]
fn test_freeform_setup_syncs_as_full_position() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_ok!(coach.load_position("8/8/8/8/8/8/8/QQQQ4 w - - 0 1", Some("Queens")));
    assert_eq!(coach.position().mode(), Mode::Freeform);
    pump(&mut student, &mut student_rx);
    assert_converged!(student, coach);

    assert_ok!(student.attempt_move(sq("a1"), sq("h8"), None));
    assert_eq!(student.position().fen(), "7Q/8/8/8/8/8/8/1QQQ4 w - - 0 1");
    pump(&mut coach, &mut coach_rx);
    assert_converged!(coach, student);
    assert!(coach.position().history().is_empty());
}

#[test]
fn test_remote_move_clears_annotations() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    coach.set_annotations(
        vec![Arrow {
            from: sq("e2"),
            to: sq("e4"),
        }],
        Default::default(),
    );
    coach.toggle_square(sq("e4"), serde_json::json!({"background": "rgba(255,0,0,0.4)"}));
    pump(&mut student, &mut student_rx);
    assert_eq!(student.annotations().arrows.len(), 1);
    assert_eq!(student.annotations().squares.len(), 1);

    assert_ok!(coach.attempt_move(sq("e2"), sq("e4"), None));
    assert!(coach.annotations().is_empty());
    pump(&mut student, &mut student_rx);
    assert!(student.annotations().is_empty());
}

#[test]
fn test_undo_and_reset_propagate() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_ok!(coach.attempt_move(sq("e2"), sq("e4"), None));
    assert_ok!(coach.attempt_move(sq("e7"), sq("e5"), None));
    assert_ok!(coach.undo());
    pump(&mut student, &mut student_rx);
    assert_eq!(student.position().history(), &["e4"]);
    assert_converged!(student, coach);

    coach.reset();
    pump(&mut student, &mut student_rx);
    assert_eq!(student.position().fen(), START_FEN);
    assert!(student.position().history().is_empty());
}

#[test]
fn test_scrubbing_is_local() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_ok!(coach.attempt_move(sq("e2"), sq("e4"), None));
    assert_ok!(coach.attempt_move(sq("e7"), sq("e5"), None));
    pump(&mut student, &mut student_rx);

    // after 1. e4
    assert_ok!(student.scrub_to(Some(0)));
    assert_eq!(
        student.position().display_fen(),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
    assert_err!(
        student.attempt_move(sq("g1"), sq("f3"), None),
        ClassroomError::InvalidState { .. }
    );
    assert_eq!(pump(&mut coach, &mut coach_rx), 0);
    assert_eq!(coach.position().display_fen(), coach.position().fen());
    assert_eq!(student.position().fen(), coach.position().fen());
}

#[test]
fn test_playlist_drives_every_board() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    let chapters = vec![
        Chapter::new("Italian", "1. e4 e5 2. Nf3 Nc6 3. Bc4"),
        Chapter {
            fen: Some("4k3/8/8/8/8/8/8/4K2R w K - 0 1".to_string()),
            ..Chapter::new("Rook endgame", "")
        },
    ];
    assert_ok!(coach.play_playlist(chapters, 0));
    pump(&mut student, &mut student_rx);
    assert_eq!(student.position().history().len(), 5);
    assert_converged!(student, coach);

    assert!(assert_ok!(coach.advance_chapter(Direction::Next)));
    pump(&mut student, &mut student_rx);
    assert_eq!(student.position().fen(), "4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    assert!(!assert_ok!(coach.advance_chapter(Direction::Next)));
    assert_eq!(coach.playlist().current_index(), Some(1));

    assert_ok!(coach.load_adhoc("1. d4", None));
    assert!(!coach.playlist().is_active());
    pump(&mut student, &mut student_rx);
    assert_eq!(student.position().history(), &["d4"]);
}

#[test]
fn test_unrecognized_load_changes_nothing() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_err!(
        coach.load_position("hello there", None),
        ClassroomError::ParseError { .. }
    );
    assert_eq!(coach.position().fen(), START_FEN);
    assert_eq!(pump(&mut student, &mut student_rx), 0);
}

#[test]
fn test_chat_and_export() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, _student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_ok!(student.send_chat("  is Nf3 better?  "));
    assert_eq!(pump(&mut coach, &mut coach_rx), 1);
    assert_eq!(coach.chat()[0].text, "is Nf3 better?");
    assert_eq!(coach.chat()[0].sender, "Sam");

    assert_ok!(coach.attempt_move(sq("e2"), sq("e4"), None));
    assert_ok!(coach.attempt_move(sq("e7"), sq("e5"), None));
    let pgn = assert_ok!(coach.export_pgn(&[("White".to_string(), "Sam".to_string())]));
    assert_contains!(pgn, "[White \"Sam\"]");
    assert_contains!(pgn, "1. e4 e5");
}

#[test]
fn test_disconnected_peer_catches_up_with_sync() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    student.transport().disconnect();
    assert_ok!(coach.attempt_move(sq("g1"), sq("f3"), None));
    assert_eq!(pump(&mut student, &mut student_rx), 0);
    assert_ne!(student.position().fen(), coach.position().fen());

    student.transport().reconnect();
    student.join();
    pump(&mut coach, &mut coach_rx);
    pump(&mut student, &mut student_rx);
    assert_converged!(student, coach);
    assert_matches!(student.position().history(), [san] if san == "Nf3");
}

#[test]
fn test_second_tab_of_a_participant_is_heard() {
    let hub = LocalHub::new(64);
    let (mut tab_a, mut tab_a_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    tab_a.join();
    for n in 0..5 {
        assert_ok!(tab_a.send_chat(&format!("note {}", n)));
    }
    let (mut tab_b, _tab_b_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    tab_b.join();
    assert_ok!(tab_a.send_chat("one more"));
    assert_ok!(tab_b.attempt_move(sq("e2"), sq("e4"), None));

    pump(&mut student, &mut student_rx);
    pump(&mut tab_a, &mut tab_a_rx);
    assert_eq!(student.position().history(), &["e4"]);
    assert_eq!(student.chat().len(), 6);
    assert_converged!(student, tab_b);
    assert_converged!(tab_a, tab_b);
}

#[test]
fn test_missed_annotation_does_not_block_next_move() {
    let hub = LocalHub::new(64);
    let (mut coach, _coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    for (from, to) in [("e2", "e4"), ("e7", "e5"), ("g1", "f3")] {
        assert_ok!(coach.attempt_move(sq(from), sq(to), None));
    }
    assert_eq!(pump(&mut student, &mut student_rx), 3);

    coach.toggle_arrow(sq("b8"), sq("c6"));
    // the annotation broadcast never reaches the student
    let lost = student_rx.drain();
    assert_eq!(lost.len(), 1);

    assert_ok!(coach.attempt_move(sq("b8"), sq("c6"), None));
    assert_eq!(pump(&mut student, &mut student_rx), 1);
    assert_eq!(student.position().history(), &["e4", "e5", "Nf3", "Nc6"]);
    assert_converged!(student, coach);
    assert!(student.annotations().is_empty());
}

#[test]
fn test_out_of_order_moves_keep_last_known_state() {
    let hub = LocalHub::new(64);
    let (mut coach, mut coach_rx) = connect(&hub, Participant::coach("c1", "Coach"));
    let (mut student, mut student_rx) = connect(&hub, Participant::student("s1", "Sam"));

    assert_ok!(coach.attempt_move(sq("e2"), sq("e4"), None));
    assert_ok!(coach.attempt_move(sq("e7"), sq("e5"), None));

    // the reply arrives first and cannot be replayed; the earlier move is then stale
    let mut queued = student_rx.drain();
    queued.reverse();
    let applied = queued
        .into_iter()
        .filter(|envelope| student.handle_incoming(envelope.clone()))
        .count();
    assert_eq!(applied, 0);
    assert_eq!(student.position().fen(), START_FEN);
    assert!(student.position().history().is_empty());

    // the next full-position broadcast repairs the divergence
    student.request_sync();
    pump(&mut coach, &mut coach_rx);
    pump(&mut student, &mut student_rx);
    assert_converged!(student, coach);
}
