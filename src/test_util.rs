// Test utilities shared by unit tests and the integration tests in "tests" folder.

use crate::event::MoveRequest;
use crate::once_cell_regex;
use crate::rules_engine::{MoveRejection, RulesEngine};


// Plays a whitespace-separated list of moves in coordinate notation, e.g. "1.e2e4 e7e5 2.g1f3".
// Move numbers are optional and not verified.
pub fn replay_moves<E: RulesEngine>(
    engine: &E, position: &E::Position, log: &str,
) -> Result<E::Position, MoveRejection> {
    let move_number_re = once_cell_regex!(r"^(?:[0-9]+\.)?(.*)$");
    let mut position = position.clone();
    for word in log.split_whitespace() {
        let notation = move_number_re
            .captures(word)
            .and_then(|caps| caps.get(1))
            .map_or(word, |m| m.as_str());
        let mv = MoveRequest::from_coordinate_notation(notation)
            .ok_or_else(|| MoveRejection::Malformed(format!("cannot parse move '{notation}'")))?;
        position = engine.apply(&position, &mv)?;
    }
    Ok(position)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::Force;
    use crate::rules_engine::StandardChess;

    #[test]
    fn replay_with_move_numbers() {
        let engine = StandardChess::new();
        let start = engine.starting_position();
        let position = replay_moves(&engine, &start, "1.e2e4 e7e5 2.g1f3").unwrap();
        assert_eq!(engine.side_to_move(&position), Force::Black);
        assert_eq!(position.full_turn_index(), 2);
        assert!(matches!(
            replay_moves(&engine, &start, "1.e2e4 1.e2e4"),
            Err(MoveRejection::Illegal(_))
        ));
        assert!(matches!(replay_moves(&engine, &start, "1.e4"), Err(MoveRejection::Malformed(_))));
    }
}
