mod common;

use common::*;
use duel_chess::board::{ChessGameStatus, DrawReason, TurnError, VictoryReason};
use duel_chess::event::MoveRequest;
use duel_chess::fen::{CLASSIC_STARTING_FEN, board_to_fen, fen_to_board};
use duel_chess::force::Force;
use duel_chess::piece::CastleDirection;
use duel_chess::rules_engine::{MoveRejection, RulesEngine, StandardChess};
use duel_chess::test_util::replay_moves;
use pretty_assertions::assert_eq;


fn play(log: &str) -> duel_chess::board::Board {
    let engine = StandardChess::new();
    replay_moves(&engine, &engine.starting_position(), log).unwrap()
}

fn illegal(error: TurnError) -> MoveRejection { MoveRejection::Illegal(error) }

#[test]
fn starting_position() {
    let engine = StandardChess::new();
    let position = engine.starting_position();
    assert_eq!(engine.serialize(&position), CLASSIC_STARTING_FEN);
    assert_eq!(engine.side_to_move(&position), Force::White);
    assert_eq!(engine.status(&position), ChessGameStatus::Active);
}

#[test]
fn first_move_fen() {
    let engine = StandardChess::new();
    let position = engine.apply(&engine.starting_position(), &mv("e2", "e4")).unwrap();
    assert_eq!(
        engine.serialize(&position),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
    );
    assert_eq!(engine.side_to_move(&position), Force::Black);
}

#[test]
fn piece_trajectories() {
    let engine = StandardChess::new();
    let start = engine.starting_position();
    let apply = |from, to| engine.apply(&start, &mv(from, to)).map(|_| ());
    assert_eq!(apply("g1", "f3"), Ok(()));
    assert_eq!(apply("g1", "g3"), Err(illegal(TurnError::ImpossibleTrajectory)));
    assert_eq!(apply("f1", "c4"), Err(illegal(TurnError::PathBlocked)));
    assert_eq!(apply("e2", "e5"), Err(illegal(TurnError::ImpossibleTrajectory)));
    assert_eq!(apply("d1", "d2"), Err(illegal(TurnError::PathBlocked)));
    assert_eq!(apply("e3", "e4"), Err(illegal(TurnError::PieceMissing)));
    assert_eq!(apply("e7", "e5"), Err(illegal(TurnError::WrongTurnOrder)));
    assert_eq!(apply("e2", "e2"), Err(illegal(TurnError::ImpossibleTrajectory)));
}

#[test]
fn pawn_captures_only_diagonally() {
    let board = play("e2e4 e7e5");
    let engine = StandardChess::new();
    assert_eq!(
        engine.apply(&board, &mv("e4", "e5")).map(|_| ()),
        Err(illegal(TurnError::PathBlocked))
    );
    assert_eq!(
        engine.apply(&board, &mv("e4", "d5")).map(|_| ()),
        Err(illegal(TurnError::ImpossibleTrajectory))
    );
    let board = play("e2e4 d7d5 e4d5");
    assert!(board.grid()[sq("d5")].is(piece!(White Pawn)));
    assert_eq!(board.half_turn_clock(), 0);
}

#[test]
fn kingside_castling() {
    let board = play("e2e4 e7e5 g1f3 b8c6 f1c4 g8f6 e1g1");
    assert!(board.grid()[sq("g1")].is(piece!(White King)));
    assert!(board.grid()[sq("f1")].is(piece!(White Rook)));
    assert_eq!(board.grid()[sq("h1")], None);
    assert_eq!(board.grid()[sq("e1")], None);
    assert!(!board.castling_rights()[Force::White][CastleDirection::HSide]);
    assert!(!board.castling_rights()[Force::White][CastleDirection::ASide]);
    assert!(board.castling_rights()[Force::Black][CastleDirection::HSide]);
    assert_eq!(
        board_to_fen(&board),
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 5 4"
    );
}

#[test]
fn queenside_castling() {
    let board = play("d2d4 d7d5 b1c3 b8c6 c1f4 c8f5 d1d2 d8d7 e1c1");
    assert!(board.grid()[sq("c1")].is(piece!(White King)));
    assert!(board.grid()[sq("d1")].is(piece!(White Rook)));
    assert_eq!(board.grid()[sq("a1")], None);
    let board = play("d2d4 d7d5 b1c3 b8c6 c1f4 c8f5 d1d2 d8d7 e1c1 e8c8");
    assert!(board.grid()[sq("c8")].is(piece!(Black King)));
    assert!(board.grid()[sq("d8")].is(piece!(Black Rook)));
}

#[test]
fn castling_requires_unmoved_pieces() {
    let engine = StandardChess::new();
    // The rook went h1 -> g1 -> h1.
    let board = play("e2e4 e7e5 g1f3 a7a6 f1c4 a6a5 h1g1 a5a4 g1h1 b7b6");
    assert_eq!(
        engine.apply(&board, &mv("e1", "g1")).map(|_| ()),
        Err(illegal(TurnError::CastlingPieceHasMoved))
    );
    // The king went e1 -> e2 -> e1.
    let board = play("e2e4 e7e5 g1f3 a7a6 f1c4 a6a5 e1e2 a5a4 e2e1 b7b6");
    assert_eq!(
        engine.apply(&board, &mv("e1", "g1")).map(|_| ()),
        Err(illegal(TurnError::CastlingPieceHasMoved))
    );
}

#[test]
fn castling_blocked_or_through_check() {
    let engine = StandardChess::new();
    let board = play("e2e4 e7e5 g1f3 b8c6");
    assert_eq!(
        engine.apply(&board, &mv("e1", "g1")).map(|_| ()),
        Err(illegal(TurnError::PathBlocked))
    );

    // The rook on f8 covers f1.
    let board = fen_to_board("5r1k/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    assert_eq!(
        engine.apply(&board, &mv("e1", "g1")).map(|_| ()),
        Err(illegal(TurnError::UnprotectedKing))
    );
    // Castling out of check.
    let board = fen_to_board("4r2k/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    assert_eq!(
        engine.apply(&board, &mv("e1", "g1")).map(|_| ()),
        Err(illegal(TurnError::UnprotectedKing))
    );
    // Attacked rook does not matter.
    let board = fen_to_board("k6r/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    assert!(engine.apply(&board, &mv("e1", "g1")).is_ok());
}

#[test]
fn en_passant() {
    let engine = StandardChess::new();
    let board = play("e2e4 a7a6 e4e5 d7d5");
    assert_eq!(board.en_passant_target(), Some(sq("d6")));
    let after = engine.apply(&board, &mv("e5", "d6")).unwrap();
    assert!(after.grid()[sq("d6")].is(piece!(White Pawn)));
    assert_eq!(after.grid()[sq("d5")], None);
    assert_eq!(after.grid()[sq("e5")], None);

    // Only immediately after the double step.
    let board = play("e2e4 a7a6 e4e5 d7d5 h2h3 h7h6");
    assert_eq!(
        engine.apply(&board, &mv("e5", "d6")).map(|_| ()),
        Err(illegal(TurnError::ImpossibleTrajectory))
    );
}

#[test]
fn promotion() {
    let engine = StandardChess::new();
    let board = fen_to_board("k7/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();

    let queen = engine.apply(&board, &mv("e7", "e8")).unwrap();
    assert!(queen.grid()[sq("e8")].is(piece!(White Queen)));

    let knight = engine.apply(&board, &MoveRequest::with_promotion("e7", "e8", "N")).unwrap();
    assert!(knight.grid()[sq("e8")].is(piece!(White Knight)));

    let rook = engine.apply(&board, &MoveRequest::with_promotion("e7", "e8", "r")).unwrap();
    assert!(rook.grid()[sq("e8")].is(piece!(White Rook)));

    assert!(matches!(
        engine.apply(&board, &MoveRequest::with_promotion("e7", "e8", "k")),
        Err(MoveRejection::Malformed(_))
    ));
}

#[test]
fn pinned_piece_cannot_move() {
    let engine = StandardChess::new();
    let board = parse_board(
        "
        . . . . k . . .
        . . . . r . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . N . . .
        . . . . . . . .
        . . . . K . . .
        ",
        Force::White,
    )
    .unwrap();
    assert_eq!(
        engine.apply(&board, &mv("e3", "c4")).map(|_| ()),
        Err(illegal(TurnError::UnprotectedKing))
    );
    assert!(engine.apply(&board, &mv("e1", "d1")).is_ok());
}

#[test]
fn king_cannot_walk_into_check() {
    let engine = StandardChess::new();
    let board = parse_board(
        "
        . . . . k . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . r . . . .
        . . . . K . . .
        ",
        Force::White,
    )
    .unwrap();
    assert!(engine.apply(&board, &mv("e1", "d2")).is_ok());
    assert_eq!(
        engine.apply(&board, &mv("e1", "e2")).map(|_| ()),
        Err(illegal(TurnError::UnprotectedKing))
    );
    assert_eq!(
        engine.apply(&board, &mv("e1", "d1")).map(|_| ()),
        Err(illegal(TurnError::UnprotectedKing))
    );
}

#[test]
fn fools_mate() {
    let engine = StandardChess::new();
    let board = play("1.f2f3 e7e5 2.g2g4 d8h4");
    assert!(board.is_check());
    assert_eq!(
        engine.status(&board),
        ChessGameStatus::Victory(Force::Black, VictoryReason::Checkmate)
    );
}

#[test]
fn check_is_not_mate() {
    let engine = StandardChess::new();
    let board = play("1.e2e4 e7e5 2.f1c4 b8c6 3.c4f7");
    assert!(board.is_check());
    assert_eq!(engine.status(&board), ChessGameStatus::Active);
}

#[test]
fn stalemate() {
    let engine = StandardChess::new();
    let board = fen_to_board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!board.is_check());
    assert_eq!(engine.status(&board), ChessGameStatus::Draw(DrawReason::Stalemate));
}

#[test]
fn fen_round_trip_mid_game() {
    let board = play("e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6");
    let fen = board_to_fen(&board);
    assert_eq!(fen, "rnbqkb1r/1p2pppp/p2p1n2/8/3NP3/2N5/PPP2PPP/R1BQKB1R w KQkq - 0 6");
    assert_eq!(fen_to_board(&fen).unwrap(), board);
}
