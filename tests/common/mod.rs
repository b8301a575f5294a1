// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use duel_chess::board::{Board, CastlingRights};
use duel_chess::coord::{Col, Coord, NUM_COLS, NUM_ROWS, Row};
use duel_chess::event::MoveRequest;
use duel_chess::force::Force;
use duel_chess::grid::Grid;
use duel_chess::piece::{PieceKind, PieceOnBoard, piece_from_ascii};
use duel_chess::util::as_single_char;
use enum_map::enum_map;
use itertools::Itertools;


#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub struct PieceMatcher {
    pub kind: PieceKind,
    pub force: Force,
}

#[allow(dead_code)]
pub trait PieceIs {
    fn is(self, matcher: PieceMatcher) -> bool;
}

impl PieceIs for Option<PieceOnBoard> {
    fn is(self, matcher: PieceMatcher) -> bool {
        if let Some(piece) = self {
            piece.kind == matcher.kind && piece.force == matcher.force
        } else {
            false
        }
    }
}

#[macro_export]
macro_rules! piece {
    ($force:ident $kind:ident) => {
        common::PieceMatcher {
            force: duel_chess::force::Force::$force,
            kind: duel_chess::piece::PieceKind::$kind,
        }
    };
}

#[allow(dead_code)]
pub fn sq(algebraic: &str) -> Coord { Coord::from_algebraic(algebraic).unwrap() }

#[allow(dead_code)]
pub fn mv(from: &str, to: &str) -> MoveRequest { MoveRequest::new(from, to) }

// Parses a diagram, White at the bottom, "." for empty squares. Castling is not allowed in the
// resulting position.
#[allow(dead_code)]
pub fn parse_board(board_str: &str, active_force: Force) -> Result<Board, String> {
    let rows = board_str
        .split('\n')
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.split_ascii_whitespace().collect_vec())
        .collect_vec();
    assert_eq!(rows.len(), NUM_ROWS as usize);
    assert!(rows.iter().all(|row| row.len() == NUM_COLS as usize));
    let mut grid = Grid::new();
    for (row_idx, row) in rows.iter().rev().enumerate() {
        for (col_idx, piece_str) in row.iter().enumerate() {
            let piece_char =
                as_single_char(piece_str).ok_or_else(|| format!("Invalid piece: {}", piece_str))?;
            let coord = Coord::new(
                Row::from_zero_based(row_idx as i8),
                Col::from_zero_based(col_idx as i8),
            );
            grid[coord] = if piece_char == '.' {
                None
            } else {
                let (kind, force) = piece_from_ascii(piece_char)
                    .ok_or_else(|| format!("Invalid piece: {}", piece_char))?;
                Some(PieceOnBoard::new(kind, force))
            };
        }
    }
    let castling_rights: CastlingRights = enum_map! { _ => enum_map! { _ => false } };
    Ok(Board::from_parts(grid, active_force, castling_rights, None, 0, 1))
}


#[cfg(test)]
mod tests {
    use duel_chess::rules_engine::{RulesEngine, StandardChess};
    use duel_chess::test_util::replay_moves;

    use super::*;

    #[test]
    fn parse_board_opening() {
        let board_str = "
            r n b q k b n r
            p p p . p p p p
            . . . . . . . .
            . . . p . . . .
            . . . . P . . .
            . . . . . . . .
            P P P P . P P P
            R N B Q K B N R
        ";
        let board = parse_board(board_str, Force::White).unwrap();

        let engine = StandardChess::new();
        let expected = replay_moves(&engine, &engine.starting_position(), "e2e4 d7d5").unwrap();

        assert_eq!(board.grid(), expected.grid());
    }
}
