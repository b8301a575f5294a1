use console::Style;
use duel_chess::board::{Board, ChessGameStatus};
use duel_chess::coord::{Col, Coord, Row};
use duel_chess::force::Force;
use duel_chess::piece::piece_to_pictogram;
use itertools::Itertools;


fn format_square(ch: char) -> String { format!(" {} ", ch) }

// Renders the grid with `perspective` at the bottom, framed by row and column labels.
pub fn render_grid(board: &Board, perspective: Force) -> String {
    let colors = [
        Style::new().color256(233).on_color256(222),
        Style::new().color256(233).on_color256(230),
    ];
    let (rows, cols) = match perspective {
        Force::White => (Row::all().rev().collect_vec(), Col::all().collect_vec()),
        Force::Black => (Row::all().collect_vec(), Col::all().rev().collect_vec()),
    };
    let col_header = format!(
        "{}{}{}\n",
        format_square(' '),
        cols.iter().map(|col| format_square(col.to_algebraic())).join(""),
        format_square(' ')
    );
    let mut ret = col_header.clone();
    for &row in &rows {
        ret.push_str(&format_square(row.to_algebraic()));
        for &col in &cols {
            let coord = Coord::new(row, col);
            let color_idx = (coord.row.to_zero_based() + coord.col.to_zero_based()) % 2;
            let square = format_square(match board.grid()[coord] {
                Some(piece) => piece_to_pictogram(piece.kind, piece.force),
                None => ' ',
            });
            ret.push_str(&colors[color_idx as usize].apply_to(square).to_string());
        }
        ret.push_str(&format_square(row.to_algebraic()));
        ret.push('\n');
    }
    ret.push_str(&col_header);
    ret
}

pub fn render_status(board: &Board) -> String {
    match board.status() {
        ChessGameStatus::Active => {
            let check = if board.is_check() { " (check)" } else { "" };
            format!("{:?} to move{}", board.active_force(), check)
        }
        ChessGameStatus::Victory(winner, reason) => {
            Style::new().magenta().apply_to(format!("Game over: {winner:?} wins by {reason:?}")).to_string()
        }
        ChessGameStatus::Draw(reason) => {
            Style::new().magenta().apply_to(format!("Game over: draw by {reason:?}")).to_string()
        }
    }
}


#[cfg(test)]
mod tests {
    use duel_chess::fen::fen_to_board;

    use super::*;

    #[test]
    fn board_orientation() {
        console::set_colors_enabled(false);
        let board = Board::classic();
        let white_view = render_grid(&board, Force::White);
        let black_view = render_grid(&board, Force::Black);
        let white_lines = white_view.lines().collect_vec();
        let black_lines = black_view.lines().collect_vec();
        assert_eq!(white_lines.len(), 10);
        assert_eq!(white_lines[0].trim(), "a  b  c  d  e  f  g  h");
        assert_eq!(black_lines[0].trim(), "h  g  f  e  d  c  b  a");
        assert!(white_lines[1].contains('♜') && white_lines[1].starts_with(" 8 "));
        assert!(black_lines[1].contains('♖') && black_lines[1].starts_with(" 1 "));
    }

    #[test]
    fn status_line() {
        console::set_colors_enabled(false);
        assert_eq!(render_status(&Board::classic()), "White to move");
        let mated = fen_to_board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert_eq!(render_status(&mated), "Game over: Black wins by Checkmate");
    }
}
