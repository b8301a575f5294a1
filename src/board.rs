// Improvement potential. Chess draws: dead position, fifty-move rule, threefold repetition.
//   The half-turn clock is already tracked, so fifty-move rule is a matter of reporting it.

use enum_map::{EnumMap, enum_map};
use serde::{Deserialize, Serialize};

use crate::coord::{Col, Coord, SubjectiveRow};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{CastleDirection, PieceKind, PieceOnBoard};
use crate::util::sort_two;


pub type CastlingRights = EnumMap<Force, EnumMap<CastleDirection, bool>>;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

fn should_promote(force: Force, piece_kind: PieceKind, to: Coord) -> bool {
    piece_kind == PieceKind::Pawn && to.row == SubjectiveRow::last().to_row(force)
}

fn rook_home(force: Force, dir: CastleDirection) -> Coord {
    let row = SubjectiveRow::first().to_row(force);
    match dir {
        CastleDirection::ASide => Coord::new(row, Col::A),
        CastleDirection::HSide => Coord::new(row, Col::H),
    }
}

fn king_home(force: Force) -> Coord { Coord::new(SubjectiveRow::first().to_row(force), Col::E) }

// Square that is captured when moving `from` -> `to`, if any. Differs from `to` for en passant.
fn get_capture(grid: &Grid, from: Coord, to: Coord, en_passant_target: Option<Coord>) -> Option<Coord> {
    let piece = grid[from]?;
    if let Some(target_piece) = grid[to] {
        if target_piece.force == piece.force { None } else { Some(to) }
    } else if piece.kind == PieceKind::Pawn
        && en_passant_target == Some(to)
        && (to.col - from.col).abs() == 1
    {
        Some(Coord::new(from.row, to.col))
    } else {
        None
    }
}

// Whether any piece of force `by` attacks `target`. The target square itself is not examined,
// so this works for empty squares (castling path) as well as for kings.
fn is_attacked(grid: &Grid, target: Coord, by: Force) -> bool {
    grid.pieces().any(|(from, piece)| {
        piece.force == by
            && matches!(
                proto_reachability_modulo_destination_square(grid, from, target),
                ProtoReachability::Ok | ProtoReachability::OkIfCapturing
            )
    })
}

fn is_check_to(grid: &Grid, force: Force) -> bool {
    match grid.find_king(force) {
        Some(king_pos) => is_attacked(grid, king_pos, force.opponent()),
        // Only reachable with hand-crafted positions; a missing king cannot be attacked.
        None => false,
    }
}

fn reachability(grid: &Grid, from: Coord, to: Coord, capturing: bool) -> Reachability {
    use ProtoReachability::*;
    match proto_reachability(grid, from, to) {
        Ok => Reachability::Ok,
        OkIfCapturing => if capturing { Reachability::Ok } else { Reachability::Impossible },
        OkIfNonCapturing => if !capturing { Reachability::Ok } else { Reachability::Blocked },
        Blocked => Reachability::Blocked,
        Impossible => Reachability::Impossible,
    }
}

// Tests that the piece can move in such a way and that the path is free.
// Does not support castling.
fn proto_reachability(grid: &Grid, from: Coord, to: Coord) -> ProtoReachability {
    use ProtoReachability::*;
    let proto = proto_reachability_modulo_destination_square(grid, from, to);
    match proto {
        Blocked | Impossible => proto,
        Ok | OkIfCapturing | OkIfNonCapturing => {
            if let (Some(target), Some(piece)) = (grid[to], grid[from]) {
                if target.force == piece.force {
                    return Blocked;
                }
            }
            proto
        }
    }
}

fn proto_reachability_modulo_destination_square(
    grid: &Grid, from: Coord, to: Coord,
) -> ProtoReachability {
    use ProtoReachability::*;
    if to == from {
        return Impossible;
    }
    let Some(piece) = grid[from] else {
        return Impossible;
    };

    let (d_row, d_col) = to - from;
    let is_straight_move = d_row == 0 || d_col == 0;
    let is_diagonal_move = d_row.abs() == d_col.abs();
    // Tests that squares between `from` (exclusive) and `to` (exclusive) are free.
    let has_linear_passage = || {
        let direction = (d_row.signum(), d_col.signum());
        let mut pos = from;
        loop {
            match pos.offset(direction) {
                Some(next) if next == to => return true,
                Some(next) if grid[next].is_none() => pos = next,
                _ => return false,
            }
        }
    };
    let simple_linear_passage = || if has_linear_passage() { Ok } else { Blocked };

    match piece.kind {
        PieceKind::Pawn => {
            let dir_forward = piece.force.direction_forward();
            let second_row = SubjectiveRow::from_one_based(2).to_row(piece.force);
            let valid_capturing_move = d_col.abs() == 1 && d_row == dir_forward;
            let valid_non_capturing_move = d_col == 0
                && (d_row == dir_forward || (from.row == second_row && d_row == dir_forward * 2));
            if valid_capturing_move {
                OkIfCapturing
            } else if valid_non_capturing_move {
                if has_linear_passage() { OkIfNonCapturing } else { Blocked }
            } else {
                Impossible
            }
        }
        PieceKind::Knight => {
            if sort_two((d_row.abs(), d_col.abs())) == (1, 2) { Ok } else { Impossible }
        }
        PieceKind::Bishop => {
            if is_diagonal_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::Rook => {
            if is_straight_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::Queen => {
            if is_straight_move || is_diagonal_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::King => {
            if d_row.abs() <= 1 && d_col.abs() <= 1 { Ok } else { Impossible }
        }
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ProtoReachability {
    Ok,
    OkIfCapturing,
    OkIfNonCapturing,
    Blocked,
    Impossible,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Reachability {
    Ok,
    Blocked,
    Impossible,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct TurnOutcome {
    new_grid: Grid,
    capture: bool,
    castle: Option<CastleDirection>,
}

// Castling is expressed as a king move by two columns, e.g. "e1" -> "g1".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TurnMove {
    pub from: Coord,
    pub to: Coord,
    // Ignored unless the move is a promotion. Promotion without a piece means queen.
    pub promote_to: Option<PieceKind>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum VictoryReason {
    Checkmate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ChessGameStatus {
    Active,
    Victory(Force, VictoryReason),
    Draw(DrawReason),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TurnError {
    PieceMissing,
    WrongTurnOrder,
    ImpossibleTrajectory,
    PathBlocked,
    UnprotectedKing,
    CastlingPieceHasMoved,
    BadPromotion,
}

impl Reachability {
    fn into_result(self) -> Result<(), TurnError> {
        match self {
            Reachability::Ok => Ok(()),
            Reachability::Blocked => Err(TurnError::PathBlocked),
            Reachability::Impossible => Err(TurnError::ImpossibleTrajectory),
        }
    }
}

// Full chess position: everything FEN describes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    grid: Grid,
    active_force: Force,
    castling_rights: CastlingRights,
    en_passant_target: Option<Coord>, // the square a pawn has just skipped over
    half_turn_clock: u32,
    full_turn_index: u32,
}

impl Board {
    pub fn classic() -> Board {
        let mut grid = Grid::new();
        for force in [Force::White, Force::Black] {
            let first_row = SubjectiveRow::first().to_row(force);
            let second_row = SubjectiveRow::from_one_based(2).to_row(force);
            for (col, kind) in Col::all().zip(BACK_RANK) {
                grid[Coord::new(first_row, col)] = Some(PieceOnBoard::new(kind, force));
                grid[Coord::new(second_row, col)] = Some(PieceOnBoard::new(PieceKind::Pawn, force));
            }
        }
        Board {
            grid,
            active_force: Force::White,
            castling_rights: enum_map! { _ => enum_map! { _ => true } },
            en_passant_target: None,
            half_turn_clock: 0,
            full_turn_index: 1,
        }
    }

    pub fn from_parts(
        grid: Grid, active_force: Force, castling_rights: CastlingRights,
        en_passant_target: Option<Coord>, half_turn_clock: u32, full_turn_index: u32,
    ) -> Board {
        Board {
            grid,
            active_force,
            castling_rights,
            en_passant_target,
            half_turn_clock,
            full_turn_index,
        }
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn active_force(&self) -> Force { self.active_force }
    pub fn castling_rights(&self) -> &CastlingRights { &self.castling_rights }
    pub fn en_passant_target(&self) -> Option<Coord> { self.en_passant_target }
    pub fn half_turn_clock(&self) -> u32 { self.half_turn_clock }
    pub fn full_turn_index(&self) -> u32 { self.full_turn_index }

    pub fn is_check(&self) -> bool { is_check_to(&self.grid, self.active_force) }

    pub fn status(&self) -> ChessGameStatus {
        if self.has_legal_turns() {
            ChessGameStatus::Active
        } else if self.is_check() {
            ChessGameStatus::Victory(self.active_force.opponent(), VictoryReason::Checkmate)
        } else {
            ChessGameStatus::Draw(DrawReason::Stalemate)
        }
    }

    pub fn is_legal(&self, mv: TurnMove) -> bool { self.turn_outcome(mv).is_ok() }

    pub fn try_turn(&mut self, mv: TurnMove) -> Result<(), TurnError> {
        // Turn application is split into two phases:
        //   - First, check turn validity and determine the outcome (does not change
        //     game state, can fail if the turn is invalid).
        //   - Second, apply the outcome (changes game state, cannot fail).
        let outcome = self.turn_outcome(mv)?;
        self.apply_turn(mv, outcome);
        Ok(())
    }

    fn has_legal_turns(&self) -> bool {
        self.grid.pieces().filter(|(_, piece)| piece.force == self.active_force).any(|(from, _)| {
            Coord::all().any(|to| self.is_legal(TurnMove { from, to, promote_to: None }))
        })
    }

    fn apply_turn(&mut self, mv: TurnMove, outcome: TurnOutcome) {
        let force = self.active_force;
        let piece_kind = self.grid[mv.from].map(|p| p.kind);

        if piece_kind == Some(PieceKind::King) || outcome.castle.is_some() {
            self.castling_rights[force] = enum_map! { _ => false };
        }
        for f in [Force::White, Force::Black] {
            for dir in [CastleDirection::ASide, CastleDirection::HSide] {
                let home = rook_home(f, dir);
                if mv.from == home || mv.to == home {
                    self.castling_rights[f][dir] = false;
                }
            }
        }

        self.en_passant_target = None;
        if piece_kind == Some(PieceKind::Pawn) && (mv.to.row - mv.from.row).abs() == 2 {
            self.en_passant_target = mv.from.offset((force.direction_forward(), 0));
        }

        if piece_kind == Some(PieceKind::Pawn) || outcome.capture {
            self.half_turn_clock = 0;
        } else {
            self.half_turn_clock = self.half_turn_clock.saturating_add(1);
        }
        if force == Force::Black {
            self.full_turn_index = self.full_turn_index.saturating_add(1);
        }

        self.grid = outcome.new_grid;
        self.active_force = force.opponent();
    }

    fn turn_outcome(&self, mv: TurnMove) -> Result<TurnOutcome, TurnError> {
        let force = self.active_force;
        let piece = self.grid[mv.from].ok_or(TurnError::PieceMissing)?;
        if piece.force != force {
            return Err(TurnError::WrongTurnOrder);
        }

        let (d_row, d_col) = mv.to - mv.from;
        if piece.kind == PieceKind::King && mv.from == king_home(force) && d_row == 0 && d_col.abs() == 2 {
            let dir = if d_col > 0 { CastleDirection::HSide } else { CastleDirection::ASide };
            return self.castle_outcome(dir);
        }

        let capture_pos = get_capture(&self.grid, mv.from, mv.to, self.en_passant_target);
        reachability(&self.grid, mv.from, mv.to, capture_pos.is_some()).into_result()?;

        let mut new_grid = self.grid;
        new_grid[mv.from] = None;
        if let Some(capture_pos) = capture_pos {
            new_grid[capture_pos] = None;
        }
        new_grid[mv.to] = if should_promote(force, piece.kind, mv.to) {
            let promote_to = mv.promote_to.unwrap_or(PieceKind::Queen);
            if !promote_to.can_promote_to() {
                return Err(TurnError::BadPromotion);
            }
            Some(PieceOnBoard::new(promote_to, force))
        } else {
            Some(piece)
        };

        if is_check_to(&new_grid, force) {
            return Err(TurnError::UnprotectedKing);
        }
        Ok(TurnOutcome {
            new_grid,
            capture: capture_pos.is_some(),
            castle: None,
        })
    }

    fn castle_outcome(&self, dir: CastleDirection) -> Result<TurnOutcome, TurnError> {
        let force = self.active_force;
        let row = SubjectiveRow::first().to_row(force);
        let king_from = king_home(force);
        let rook_from = rook_home(force, dir);
        let (king_to, rook_to) = match dir {
            CastleDirection::ASide => (Coord::new(row, Col::C), Coord::new(row, Col::D)),
            CastleDirection::HSide => (Coord::new(row, Col::G), Coord::new(row, Col::F)),
        };

        let rook = self.grid[rook_from];
        if !self.castling_rights[force][dir]
            || rook != Some(PieceOnBoard::new(PieceKind::Rook, force))
        {
            return Err(TurnError::CastlingPieceHasMoved);
        }

        let (col_min, col_max) = sort_two((king_from.col, rook_from.col));
        let mut between = Col::all().filter(|col| *col > col_min && *col < col_max);
        if between.any(|col| self.grid[Coord::new(row, col)].is_some()) {
            return Err(TurnError::PathBlocked);
        }

        // King may not start in, pass through or end up in check.
        let (king_col_min, king_col_max) = sort_two((king_from.col, king_to.col));
        let king_path = Col::all().filter(|col| *col >= king_col_min && *col <= king_col_max);
        for col in king_path {
            if is_attacked(&self.grid, Coord::new(row, col), force.opponent()) {
                return Err(TurnError::UnprotectedKing);
            }
        }

        let mut new_grid = self.grid;
        let king = new_grid[king_from].take();
        new_grid[rook_from] = None;
        new_grid[king_to] = king;
        new_grid[rook_to] = rook;
        if is_check_to(&new_grid, force) {
            return Err(TurnError::UnprotectedKing);
        }
        Ok(TurnOutcome { new_grid, capture: false, castle: Some(dir) })
    }
}
