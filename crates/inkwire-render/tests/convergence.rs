//! Multi-peer convergence: two whiteboards exchanging relay frames end
//! up with byte-identical canvases.

use inkwire_core::StrokeLog;
use inkwire_core::config::BoardConfig;
use inkwire_core::stroke::StrokeColor;
use inkwire_core::sync::{ClientMessage, ServerMessage};
use inkwire_render::Whiteboard;
use kurbo::Point;

fn joined_board(room: &str) -> Whiteboard {
    let mut board = Whiteboard::new(BoardConfig {
        width: 64,
        height: 64,
        room: room.to_string(),
        ..BoardConfig::default()
    })
    .unwrap();
    let frame = serde_json::to_string(&ServerMessage::Joined {
        room: room.to_string(),
        peer_count: 1,
        initial_sync: None,
    })
    .unwrap();
    board.handle_server_frame(&frame);
    board
}

/// Deliver everything `from` has queued into `to`, as the relay would.
fn relay(from: &mut Whiteboard, to: &mut Whiteboard) {
    for json in from.room_mut().take_outgoing() {
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        if let ClientMessage::Sync { data } = msg {
            let frame = serde_json::to_string(&ServerMessage::Sync {
                from: from.room().peer_id().to_string(),
                data,
            })
            .unwrap();
            to.handle_server_frame(&frame);
        }
    }
}

fn draw(board: &mut Whiteboard, points: &[Point]) {
    board.pointer_down(points[0]);
    for point in &points[1..] {
        board.pointer_move(*point);
    }
    board.pointer_up();
}

#[test]
fn test_two_peers_converge_to_identical_pixels() {
    let mut a = joined_board("r");
    let mut b = joined_board("r");

    a.set_brush_color(StrokeColor::new(255, 0, 0, 255));
    draw(&mut a, &[Point::new(5.0, 5.0), Point::new(40.0, 40.0)]);

    b.set_brush_color(StrokeColor::new(0, 0, 255, 255));
    draw(&mut b, &[Point::new(5.0, 50.0), Point::new(50.0, 10.0)]);

    // Exchange in both directions, then repaint
    relay(&mut a, &mut b);
    relay(&mut b, &mut a);
    a.pump();
    b.pump();

    assert_eq!(a.room().log().len(), 2);
    assert_eq!(b.room().log().len(), 2);
    assert_eq!(a.room().log().snapshot(), b.room().log().snapshot());
    assert_eq!(a.surface().data(), b.surface().data());
}

#[test]
fn test_remote_stroke_appears_on_peer_canvas() {
    let mut a = joined_board("r");
    let mut b = joined_board("r");

    a.set_brush_color(StrokeColor::new(255, 0, 0, 255));
    a.set_brush_size(3.0);
    draw(
        &mut a,
        &[
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 5.0),
        ],
    );

    relay(&mut a, &mut b);
    a.pump();
    b.pump();

    let strokes = b.room().log().snapshot();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].points.len(), 3);
    assert_eq!(strokes[0].color, StrokeColor::new(255, 0, 0, 255));
    assert!((strokes[0].size - 3.0).abs() < f64::EPSILON);

    // A pixel on the stroke's path is fully red on the remote canvas
    assert_eq!(b.surface().pixel(10, 10), Some((255, 0, 0, 255)));
    assert_eq!(a.surface().data(), b.surface().data());
}

#[test]
fn test_click_leaves_both_canvases_blank() {
    let mut a = joined_board("r");
    let mut b = joined_board("r");
    a.pump();
    b.pump();
    let blank = a.surface().data().to_vec();

    a.pointer_down(Point::new(32.0, 32.0));
    a.pointer_up();

    relay(&mut a, &mut b);
    a.pump();
    b.pump();

    assert_eq!(a.surface().data(), blank.as_slice());
    assert_eq!(b.surface().data(), blank.as_slice());
}

#[test]
fn test_clear_propagates_and_blanks_both() {
    let mut a = joined_board("r");
    let mut b = joined_board("r");
    a.pump();
    let pristine = a.surface().data().to_vec();

    for i in 0..5 {
        let y = 5.0 + f64::from(i) * 10.0;
        draw(&mut a, &[Point::new(5.0, y), Point::new(55.0, y)]);
    }
    relay(&mut a, &mut b);
    a.pump();
    b.pump();
    assert_eq!(b.room().log().len(), 5);
    assert_ne!(b.surface().data(), pristine.as_slice());

    assert!(a.clear());
    relay(&mut a, &mut b);
    a.pump();
    b.pump();

    assert_eq!(a.room().log().len(), 0);
    assert_eq!(b.room().log().len(), 0);
    assert_eq!(a.surface().data(), pristine.as_slice());
    assert_eq!(b.surface().data(), pristine.as_slice());
}

#[test]
fn test_concurrent_draws_converge() {
    let mut a = joined_board("r");
    let mut b = joined_board("r");

    // Both draw before seeing each other's stroke
    draw(&mut a, &[Point::new(0.0, 10.0), Point::new(60.0, 10.0)]);
    draw(&mut b, &[Point::new(0.0, 50.0), Point::new(60.0, 50.0)]);

    relay(&mut a, &mut b);
    relay(&mut b, &mut a);
    // A second round carries each peer's merged state back
    a.room_mut().broadcast_sync();
    b.room_mut().broadcast_sync();
    relay(&mut a, &mut b);
    relay(&mut b, &mut a);

    a.pump();
    b.pump();

    assert_eq!(a.room().log().len(), 2);
    assert_eq!(a.room().log().snapshot(), b.room().log().snapshot());
    assert_eq!(a.surface().data(), b.surface().data());
}
