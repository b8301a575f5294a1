#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod board;
pub mod coord;
pub mod event;
pub mod fen;
pub mod force;
pub mod game_session;
pub mod grid;
pub mod piece;
pub mod rules_engine;
pub mod server;
pub mod test_util;
pub mod util;
