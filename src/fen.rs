// Standard FEN (https://www.chessprogramming.org/Forsyth-Edwards_Notation) with classic
// "KQkq" castling notation.

use enum_map::enum_map;
use itertools::Itertools;

use crate::board::{Board, CastlingRights};
use crate::coord::{Col, Coord, NUM_COLS, NUM_ROWS, Row};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{CastleDirection, PieceKind, PieceOnBoard, piece_from_ascii, piece_to_ascii};
use crate::util::as_single_char;


pub const CLASSIC_STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const CASTLING_NOTATION: [(Force, CastleDirection, char); 4] = [
    (Force::White, CastleDirection::HSide, 'K'),
    (Force::White, CastleDirection::ASide, 'Q'),
    (Force::Black, CastleDirection::HSide, 'k'),
    (Force::Black, CastleDirection::ASide, 'q'),
];

fn castling_rights_to_fen(castling_rights: &CastlingRights) -> String {
    let s: String = CASTLING_NOTATION
        .iter()
        .filter(|(force, dir, _)| castling_rights[*force][*dir])
        .map(|(_, _, ch)| ch)
        .collect();
    if s.is_empty() { "-".to_owned() } else { s }
}
fn castling_rights_from_fen(s: &str) -> Result<CastlingRights, String> {
    let mut castling_rights = enum_map! { _ => enum_map! { _ => false } };
    if s == "-" {
        return Ok(castling_rights);
    }
    for ch in s.chars() {
        let (force, dir, _) = CASTLING_NOTATION
            .iter()
            .find(|(_, _, notation)| *notation == ch)
            .ok_or_else(|| format!("invalid castling rights: {s}"))?;
        castling_rights[*force][*dir] = true;
    }
    Ok(castling_rights)
}

fn en_passant_target_to_fen(en_passant_target: Option<Coord>) -> String {
    match en_passant_target {
        None => "-".to_owned(),
        Some(pos) => pos.to_algebraic(),
    }
}
fn en_passant_target_from_fen(s: &str) -> Result<Option<Coord>, String> {
    if s == "-" {
        Ok(None)
    } else {
        let pos =
            Coord::from_algebraic(s).ok_or_else(|| format!("invalid en passant target: {s}"))?;
        Ok(Some(pos))
    }
}

fn grid_to_fen(grid: &Grid) -> String {
    Row::all()
        .rev()
        .map(|row| {
            let mut row_notation = String::new();
            let mut empty_col_count: u8 = 0;
            for col in Col::all() {
                if let Some(piece) = grid[Coord::new(row, col)] {
                    if empty_col_count > 0 {
                        row_notation.push_str(&empty_col_count.to_string());
                        empty_col_count = 0;
                    }
                    row_notation.push(piece_to_ascii(piece.kind, piece.force));
                } else {
                    empty_col_count += 1;
                }
            }
            if empty_col_count > 0 {
                row_notation.push_str(&empty_col_count.to_string());
            }
            row_notation
        })
        .join("/")
}

fn grid_from_fen(notation: &str) -> Result<Grid, String> {
    let mut grid = Grid::new();
    let rows = notation.split('/').collect_vec();
    if rows.len() != NUM_ROWS as usize {
        return Err(format!("invalid FEN: has {} rows, expected {}", rows.len(), NUM_ROWS));
    }
    for (row_idx, row_notation) in rows.iter().rev().enumerate() {
        let row = Row::from_zero_based(row_idx as i8);
        let mut col_idx: i8 = 0;
        for ch in row_notation.chars() {
            if let Some(n) = ch.to_digit(10) {
                col_idx += n as i8;
            } else {
                let (kind, force) =
                    piece_from_ascii(ch).ok_or_else(|| format!("invalid FEN: unknown piece: {ch}"))?;
                if col_idx < NUM_COLS {
                    grid[Coord::new(row, Col::from_zero_based(col_idx))] =
                        Some(PieceOnBoard::new(kind, force));
                }
                col_idx += 1;
            }
            if col_idx > NUM_COLS {
                break;
            }
        }
        if col_idx != NUM_COLS {
            return Err(format!(
                "invalid FEN: row {} has {} columns, expected {}",
                row.to_algebraic(),
                col_idx,
                NUM_COLS
            ));
        }
    }
    Ok(grid)
}

pub fn board_to_fen(board: &Board) -> String {
    format!(
        "{} {} {} {} {} {}",
        grid_to_fen(board.grid()),
        board.active_force().to_fen(),
        castling_rights_to_fen(board.castling_rights()),
        en_passant_target_to_fen(board.en_passant_target()),
        board.half_turn_clock(),
        board.full_turn_index()
    )
}

pub fn fen_to_board(fen: &str) -> Result<Board, String> {
    let (
        grid_notation,
        active_force_notation,
        castling_notation,
        en_passant_target_notation,
        half_turn_clock,
        full_turn_index,
    ) = fen
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| format!("invalid FEN: {fen}"))?;

    let grid = grid_from_fen(grid_notation)?;
    for force in [Force::White, Force::Black] {
        let num_kings =
            grid.pieces().filter(|(_, p)| p.force == force && p.kind == PieceKind::King).count();
        if num_kings != 1 {
            return Err(format!("invalid FEN: expected exactly one {force:?} king"));
        }
    }
    let active_force = as_single_char(active_force_notation)
        .and_then(Force::from_fen)
        .ok_or_else(|| format!("invalid force: {active_force_notation}"))?;
    let castling_rights = castling_rights_from_fen(castling_notation)?;
    let en_passant_target = en_passant_target_from_fen(en_passant_target_notation)?;
    let half_turn_clock = half_turn_clock
        .parse::<u32>()
        .map_err(|_| format!("invalid half-turn clock: {half_turn_clock}"))?;
    let full_turn_index = full_turn_index
        .parse::<u32>()
        .map_err(|_| format!("invalid full turn index: {full_turn_index}"))?;

    Ok(Board::from_parts(
        grid,
        active_force,
        castling_rights,
        en_passant_target,
        half_turn_clock,
        full_turn_index,
    ))
}
