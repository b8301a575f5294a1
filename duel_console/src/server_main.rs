// Improvement potential. The server mixes a blocking coordinator thread with async connection
//   tasks. It works because the coordinator never awaits, but a fully async event loop would
//   make shutdown simpler.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_std::net::{TcpListener, TcpStream};
use async_tungstenite::WebSocketStream;
use duel_chess::event::ChessClientEvent;
use duel_chess::rules_engine::StandardChess;
use duel_chess::server::*;
use futures_io::{AsyncRead, AsyncWrite};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;

use crate::network::{self, CommunicationError};
use crate::server_config::ServerConfig;


#[derive(Clone, Copy, Debug)]
struct Heartbeat {
    ping_interval: Duration,
    connection_timeout: Duration,
}

// Removes the client and notifies the coordinator. Only the first caller for a given client
// gets the logging id back, so `Disconnect` is sent exactly once.
fn disconnect_client(
    clients: &Mutex<Clients>, tx: &mpsc::SyncSender<IncomingEvent>, client_id: ClientId,
) -> Option<String> {
    let logging_id = clients.lock().unwrap().remove_client(client_id)?;
    let _ = tx.send(IncomingEvent::Disconnect(client_id));
    Some(logging_id)
}

fn reject_handshake(reason: String) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

async fn handle_connection<S: AsyncRead + AsyncWrite + Unpin + Send + 'static>(
    peer_addr: String, stream: WebSocketStream<S>, session_id: SessionId,
    tx: mpsc::SyncSender<IncomingEvent>, clients: Arc<Mutex<Clients>>, heartbeat: Heartbeat,
) {
    let (mut stream_tx, mut stream_rx) = StreamExt::split(stream);
    info!("Client {peer_addr} connected to session {session_id}");

    let (client_tx, client_rx) = async_std::channel::unbounded();
    let client_id = clients.lock().unwrap().add_client(client_tx, peer_addr.clone());
    // Must be queued before the reader starts, so that `Connect` precedes the first move.
    if tx.send(IncomingEvent::Connect(client_id, session_id)).is_err() {
        clients.lock().unwrap().remove_client(client_id);
        return;
    }

    // Client -> Server
    let clients_reader = Arc::clone(&clients);
    let tx_reader = tx.clone();
    async_std::task::spawn(async move {
        loop {
            let read = async_std::future::timeout(
                heartbeat.connection_timeout,
                network::read_message_async(&mut stream_rx),
            )
            .await;
            let result = match read {
                Ok(Ok(msg)) => network::decode_message::<ChessClientEvent>(msg),
                Ok(Err(err)) => Err(err),
                Err(_) => {
                    if let Some(logging_id) = disconnect_client(&clients_reader, &tx_reader, client_id)
                    {
                        warn!(
                            "Client {logging_id} timed out after {:?} of silence",
                            heartbeat.connection_timeout
                        );
                    }
                    break;
                }
            };
            match result {
                Ok(Some(ev)) => {
                    if tx_reader.send(IncomingEvent::Network(client_id, ev)).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(CommunicationError::Serde(err)) => {
                    warn!("Dropping undecodable message from client {client_id:?}: {err}");
                }
                Err(err) => {
                    if let Some(logging_id) = disconnect_client(&clients_reader, &tx_reader, client_id)
                    {
                        match err {
                            CommunicationError::ConnectionClosed => {
                                info!("Client {logging_id} disconnected")
                            }
                            err => warn!("Client {logging_id} disconnected due to read error: {err:?}"),
                        }
                    }
                    break;
                }
            }
        }
    });

    // Server -> Client. Ends when the client is removed: that drops the only sender.
    loop {
        let write_result =
            match async_std::future::timeout(heartbeat.ping_interval, client_rx.recv()).await {
                Ok(Ok(ev)) => network::write_obj_async(&mut stream_tx, &ev).await,
                Ok(Err(_)) => break,
                Err(_) => network::write_ping_async(&mut stream_tx).await,
            };
        if let Err(err) = write_result {
            if let Some(logging_id) = disconnect_client(&clients, &tx, client_id) {
                warn!("Client {logging_id} disconnected due to write error: {err:?}");
            }
            break;
        }
    }
    let _ = stream_tx.close().await;
}

async fn accept_connection(
    stream: TcpStream, peer_addr: String, tx: mpsc::SyncSender<IncomingEvent>,
    clients: Arc<Mutex<Clients>>, heartbeat: Heartbeat,
) {
    let mut session_id = None;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match SessionId::from_url_path(request.uri().path()) {
            Ok(id) => {
                session_id = Some(id);
                Ok(response)
            }
            Err(err) => Err(reject_handshake(err)),
        }
    };
    let stream = match async_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!("WebSocket handshake with {peer_addr} failed: {err}");
            return;
        }
    };
    let Some(session_id) = session_id else {
        error!("Handshake with {peer_addr} succeeded without a session id");
        return;
    };
    handle_connection(peer_addr, stream, session_id, tx, clients, heartbeat).await;
}

pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    let engine = match &config.starting_fen {
        Some(fen) => StandardChess::from_fen(fen)
            .map_err(|err| anyhow!(err))
            .context("Invalid starting_fen")?,
        None => StandardChess::new(),
    };
    let options = ServerOptions { out_of_turn_policy: config.out_of_turn_policy };
    let heartbeat = Heartbeat {
        ping_interval: config.ping_interval,
        connection_timeout: config.connection_timeout,
    };

    let (tx, rx) = mpsc::sync_channel(1000);
    let clients = Arc::new(Mutex::new(Clients::new()));
    let clients_copy = Arc::clone(&clients);
    let coordinator = thread::spawn(move || {
        let mut server_state = ServerState::new(options, clients_copy, engine);
        for event in rx {
            let terminate = matches!(event, IncomingEvent::Terminate);
            server_state.apply_event(event);
            if terminate {
                break;
            }
        }
    });

    let tx_terminate = tx.clone();
    ctrlc::set_handler(move || {
        let _ = tx_terminate.send(IncomingEvent::Terminate);
    })
    .context("Cannot install Ctrl-C handler")?;

    let listener = async_std::task::block_on(TcpListener::bind(("0.0.0.0", config.port)))
        .with_context(|| format!("Cannot listen on port {}", config.port))?;
    info!("Listening to connections on {}...", listener.local_addr()?);
    async_std::task::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    async_std::task::spawn(accept_connection(
                        stream,
                        peer_addr.to_string(),
                        tx.clone(),
                        Arc::clone(&clients),
                        heartbeat,
                    ));
                }
                Err(err) => warn!("Cannot establish connection: {err}"),
            }
        }
    });

    coordinator.join().map_err(|_| anyhow!("Coordinator thread panicked"))?;
    info!("Server stopped");
    Ok(())
}
