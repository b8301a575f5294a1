use std::io::{self, BufRead};
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, anyhow};
use console::Style;
use duel_chess::board::Board;
use duel_chess::event::{ChessClientEvent, ChessServerEvent, MoveRequest};
use duel_chess::force::Force;
use duel_chess::rules_engine::StandardChess;
use tungstenite::protocol;

use crate::network::{self, CommunicationError};
use crate::tui;


pub struct ClientConfig {
    pub server_address: String,
    pub session_id: Option<String>,
}

enum IncomingEvent {
    Network(ChessServerEvent),
    NetworkError(CommunicationError),
    Input(String),
    EndOfInput,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum MyRole {
    Unknown,
    Player(Force),
    Spectator,
}

// "host" -> "host:3000"; "ws://host:port" -> "host:port".
fn normalize_address(address: &str) -> String {
    let address = address.trim().trim_start_matches("ws://").trim_end_matches('/');
    if address.contains(':') {
        address.to_owned()
    } else {
        format!("{address}:{}", network::DEFAULT_PORT)
    }
}

fn print_board(board: &Board, role: MyRole) {
    let perspective = match role {
        MyRole::Player(force) => force,
        MyRole::Unknown | MyRole::Spectator => Force::White,
    };
    println!("{}", tui::render_grid(board, perspective));
    println!("{}", tui::render_status(board));
}

pub fn run(config: ClientConfig) -> anyhow::Result<()> {
    let address = normalize_address(&config.server_address);
    let url = format!("ws://{}/{}", address, config.session_id.as_deref().unwrap_or(""));
    println!("Connecting to {url}...");
    let stream =
        TcpStream::connect(&address).with_context(|| format!("Cannot connect to {address}"))?;
    let (mut socket_in, _) = tungstenite::client::client(url.as_str(), stream)
        .map_err(|err| anyhow!("WebSocket handshake failed: {err}"))?;
    let mut socket_out = network::clone_websocket(&socket_in, protocol::Role::Client)?;

    let (tx, rx) = mpsc::channel();
    let tx_net = tx.clone();
    thread::spawn(move || {
        loop {
            match network::read_obj(&mut socket_in) {
                Ok(ev) => {
                    if tx_net.send(IncomingEvent::Network(ev)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_net.send(IncomingEvent::NetworkError(err));
                    break;
                }
            }
        }
    });
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(IncomingEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(IncomingEvent::EndOfInput);
    });

    let engine = StandardChess::new();
    let error_style = Style::new().red();
    let mut role = MyRole::Unknown;
    let mut board = None;
    for event in rx {
        match event {
            IncomingEvent::Network(event) => match event {
                ChessServerEvent::PlayerRole(force) => {
                    role = MyRole::Player(force);
                    println!("You play {force:?}. Enter moves like 'e2e4' or 'e7e8q', '/quit' to leave.");
                }
                ChessServerEvent::SpectatorRole => {
                    role = MyRole::Spectator;
                    println!("Both seats are taken: you are watching.");
                }
                ChessServerEvent::Move(mv) => {
                    println!("Move: {}", mv.to_coordinate_notation());
                }
                ChessServerEvent::BoardState(fen) => match engine.parse(&fen) {
                    Ok(new_board) => {
                        print_board(&new_board, role);
                        board = Some(new_board);
                    }
                    Err(err) => {
                        println!("{}", error_style.apply_to(format!("Cannot parse board state: {err}")));
                    }
                },
                ChessServerEvent::InvalidMove(mv) => {
                    println!(
                        "{}",
                        error_style.apply_to(format!("Move rejected: {}", mv.to_coordinate_notation()))
                    );
                }
            },
            IncomingEvent::NetworkError(CommunicationError::ConnectionClosed) => {
                println!("Server closed the connection.");
                return Ok(());
            }
            IncomingEvent::NetworkError(err) => {
                return Err(anyhow!("Connection lost: {err:?}"));
            }
            IncomingEvent::Input(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                let MyRole::Player(force) = role else {
                    println!("{}", error_style.apply_to("Spectators cannot move."));
                    continue;
                };
                if board.as_ref().is_some_and(|b: &Board| b.active_force() != force) {
                    // The server would drop it anyway.
                    println!("{}", error_style.apply_to("Not your turn."));
                    continue;
                }
                match MoveRequest::from_coordinate_notation(line) {
                    Some(mv) => {
                        network::write_obj(&mut socket_out, &ChessClientEvent::Move(mv))
                            .map_err(|err| anyhow!("Cannot send move: {err:?}"))?;
                    }
                    None => {
                        println!("{}", error_style.apply_to(format!("Cannot parse move '{line}'")));
                    }
                }
            }
            IncomingEvent::EndOfInput => break,
        }
    }
    let _ = socket_out.close(None);
    let _ = socket_out.flush();
    Ok(())
}
