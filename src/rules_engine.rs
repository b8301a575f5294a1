use std::fmt;

use crate::board::{Board, ChessGameStatus, TurnError, TurnMove};
use crate::coord::Coord;
use crate::event::MoveRequest;
use crate::fen::{board_to_fen, fen_to_board};
use crate::force::Force;
use crate::piece::PieceKind;
use crate::util::as_single_char;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MoveRejection {
    // The request does not describe a move at all: bad square names, unknown promotion piece.
    Malformed(String),
    // A well-formed move that is not legal in the position.
    Illegal(TurnError),
    // The engine failed for reasons unrelated to the request.
    Internal(String),
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejection::Malformed(reason) => write!(f, "malformed move: {reason}"),
            MoveRejection::Illegal(err) => write!(f, "illegal move: {err:?}"),
            MoveRejection::Internal(reason) => write!(f, "rules engine failure: {reason}"),
        }
    }
}

// Chess legality and state transitions. The session coordinator treats positions as opaque
// beyond what this trait exposes.
//
// Implementations must be deterministic: the same position and request always produce the same
// result. `apply` must not block.
pub trait RulesEngine {
    type Position: Clone;

    fn starting_position(&self) -> Self::Position;
    fn apply(&self, position: &Self::Position, mv: &MoveRequest)
    -> Result<Self::Position, MoveRejection>;
    fn serialize(&self, position: &Self::Position) -> String;
    fn side_to_move(&self, position: &Self::Position) -> Force;
}


// Orthodox chess.
#[derive(Clone, Debug)]
pub struct StandardChess {
    starting_position: Board,
}

impl StandardChess {
    pub fn new() -> Self { StandardChess { starting_position: Board::classic() } }

    pub fn from_fen(fen: &str) -> Result<Self, String> {
        Ok(StandardChess { starting_position: fen_to_board(fen)? })
    }

    pub fn parse(&self, fen: &str) -> Result<Board, String> { fen_to_board(fen) }

    // Observers use this to detect the end of the game; the coordinator never does.
    pub fn status(&self, position: &Board) -> ChessGameStatus { position.status() }
}

pub fn parse_move_request(mv: &MoveRequest) -> Result<TurnMove, MoveRejection> {
    let parse_square = |s: &str| {
        Coord::from_algebraic(s).ok_or_else(|| MoveRejection::Malformed(format!("invalid square '{s}'")))
    };
    let from = parse_square(&mv.from)?;
    let to = parse_square(&mv.to)?;
    let promote_to = match &mv.promotion {
        None => None,
        Some(s) if s.is_empty() => None,
        Some(s) => {
            let kind = as_single_char(s)
                .and_then(|ch| PieceKind::from_algebraic_char(ch.to_ascii_uppercase()))
                .filter(|kind| kind.can_promote_to())
                .ok_or_else(|| MoveRejection::Malformed(format!("invalid promotion '{s}'")))?;
            Some(kind)
        }
    };
    Ok(TurnMove { from, to, promote_to })
}

impl RulesEngine for StandardChess {
    type Position = Board;

    fn starting_position(&self) -> Board { self.starting_position.clone() }

    fn apply(&self, position: &Board, mv: &MoveRequest) -> Result<Board, MoveRejection> {
        let turn = parse_move_request(mv)?;
        let mut new_position = position.clone();
        new_position.try_turn(turn).map_err(MoveRejection::Illegal)?;
        Ok(new_position)
    }

    fn serialize(&self, position: &Board) -> String { board_to_fen(position) }

    fn side_to_move(&self, position: &Board) -> Force { position.active_force() }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_requests() {
        let engine = StandardChess::new();
        let position = engine.starting_position();
        let rejection = |mv: MoveRequest| engine.apply(&position, &mv).unwrap_err();
        assert!(matches!(rejection(MoveRequest::new("", "e4")), MoveRejection::Malformed(_)));
        assert!(matches!(rejection(MoveRequest::new("e2", "e9")), MoveRejection::Malformed(_)));
        assert!(matches!(rejection(MoveRequest::new("e2", "e4 e5")), MoveRejection::Malformed(_)));
        assert!(matches!(
            rejection(MoveRequest::with_promotion("e2", "e4", "k")),
            MoveRejection::Malformed(_)
        ));
        assert!(matches!(
            rejection(MoveRequest::with_promotion("e2", "e4", "queen")),
            MoveRejection::Malformed(_)
        ));
    }

    #[test]
    fn promotion_letter_is_ignored_on_regular_moves() {
        // The reference web client attaches "q" to every move.
        let engine = StandardChess::new();
        let position = engine.starting_position();
        let new_position =
            engine.apply(&position, &MoveRequest::with_promotion("e2", "e4", "q")).unwrap();
        assert_eq!(engine.side_to_move(&new_position), Force::Black);
    }

    #[test]
    fn apply_does_not_touch_the_input_position() {
        let engine = StandardChess::new();
        let position = engine.starting_position();
        let before = engine.serialize(&position);
        engine.apply(&position, &MoveRequest::new("e2", "e4")).unwrap();
        assert!(engine.apply(&position, &MoveRequest::new("e2", "e5")).is_err());
        assert_eq!(engine.serialize(&position), before);
    }
}
