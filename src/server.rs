use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::board::TurnError;
use crate::event::{ChessClientEvent, ChessServerEvent, MoveRequest};
use crate::game_session::{GameSession, RoleAssignment};
use crate::once_cell_regex;
use crate::rules_engine::{MoveRejection, RulesEngine};


const DEFAULT_SESSION_NAME: &str = "default";

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: &str) -> Result<Self, String> {
        let re = once_cell_regex!(r"^[A-Za-z0-9_-]{1,64}$");
        if re.is_match(id) {
            Ok(SessionId(id.to_owned()))
        } else {
            Err(format!("invalid session id: '{id}'"))
        }
    }

    pub fn default_session() -> Self { SessionId(DEFAULT_SESSION_NAME.to_owned()) }

    // "/" is the default session, "/<id>" is a named one.
    pub fn from_url_path(path: &str) -> Result<Self, String> {
        let id = path.strip_prefix('/').unwrap_or(path);
        let id = id.strip_suffix('/').unwrap_or(id);
        if id.is_empty() { Ok(Self::default_session()) } else { Self::new(id) }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClientId(pub usize);

pub struct Client {
    events_tx: async_std::channel::Sender<ChessServerEvent>,
    logging_id: String,
}

impl Client {
    // Fire-and-forget: a client that went away will be cleaned up by its `Disconnect` event.
    fn send(&self, event: ChessServerEvent) { let _ = self.events_tx.try_send(event); }
}

pub struct Clients {
    map: HashMap<ClientId, Client>,
    next_id: usize,
}

impl Clients {
    pub fn new() -> Self { Clients { map: HashMap::new(), next_id: 1 } }

    pub fn add_client(
        &mut self, events_tx: async_std::channel::Sender<ChessServerEvent>, logging_id: String,
    ) -> ClientId {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.map.insert(id, Client { events_tx, logging_id });
        id
    }

    // Returns client logging id if the client was still registered. Both halves of a connection
    // may detect the disconnect, but only the first one gets `Some`.
    pub fn remove_client(&mut self, id: ClientId) -> Option<String> {
        self.map.remove(&id).map(|client| client.logging_id)
    }

    pub fn logging_id(&self, id: ClientId) -> Option<&str> {
        self.map.get(&id).map(|client| client.logging_id.as_str())
    }

    pub fn send(&self, id: ClientId, event: ChessServerEvent) {
        if let Some(client) = self.map.get(&id) {
            client.send(event);
        }
    }

    fn send_to_all(&self, ids: &[ClientId], event: &ChessServerEvent) {
        for &id in ids {
            self.send(id, event.clone());
        }
    }
}


#[derive(Debug)]
pub enum IncomingEvent {
    Connect(ClientId, SessionId),
    Network(ClientId, ChessClientEvent),
    Disconnect(ClientId),
    Terminate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum OutOfTurnPolicy {
    // Drop the move without telling anybody.
    #[default]
    Ignore,
    // Answer with `invalidMove` to the sender.
    Reject,
}

#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub out_of_turn_policy: OutOfTurnPolicy,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Applied,
    Rejected(MoveRejection),
    Ignored,
}


pub struct ServerState<E: RulesEngine> {
    options: ServerOptions,
    clients: Arc<Mutex<Clients>>,
    engine: E,
    sessions: HashMap<SessionId, GameSession<E::Position>>,
    // Which session each connected client belongs to. Spectators are tracked only here.
    memberships: HashMap<ClientId, SessionId>,
}

impl<E: RulesEngine> ServerState<E> {
    pub fn new(options: ServerOptions, clients: Arc<Mutex<Clients>>, engine: E) -> Self {
        ServerState {
            options,
            clients,
            engine,
            sessions: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &E { &self.engine }

    pub fn session(&self, session_id: &SessionId) -> Option<&GameSession<E::Position>> {
        self.sessions.get(session_id)
    }

    pub fn apply_event(&mut self, event: IncomingEvent) {
        match event {
            IncomingEvent::Connect(client_id, session_id) => {
                self.on_connect(client_id, session_id);
            }
            IncomingEvent::Network(client_id, ChessClientEvent::Move(mv)) => {
                self.on_move_attempt(client_id, mv);
            }
            IncomingEvent::Disconnect(client_id) => {
                self.on_disconnect(client_id);
            }
            IncomingEvent::Terminate => {
                info!("Shutting down: {} session(s) dropped", self.sessions.len());
            }
        }
    }

    pub fn on_connect(&mut self, client_id: ClientId, session_id: SessionId) -> RoleAssignment {
        if let Some(existing) = self.memberships.get(&client_id) {
            warn!("Client {client_id:?} is already connected to session {existing}");
            return self
                .sessions
                .get(existing)
                .map_or(RoleAssignment::Spectator, |session| session.role_of(client_id));
        }
        let session = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| GameSession::new(&self.engine));
        let role = session.assign_role(client_id);
        let board_state = self.engine.serialize(session.position());
        self.memberships.insert(client_id, session_id.clone());

        let clients = self.clients.lock().unwrap();
        info!(
            "Client {} joined session {session_id} as {role:?}",
            clients.logging_id(client_id).unwrap_or("?")
        );
        let role_event = match role {
            RoleAssignment::Player(force) => ChessServerEvent::PlayerRole(force),
            RoleAssignment::Spectator => ChessServerEvent::SpectatorRole,
        };
        clients.send(client_id, role_event);
        clients.send(client_id, ChessServerEvent::BoardState(board_state));
        role
    }

    pub fn on_disconnect(&mut self, client_id: ClientId) {
        let Some(session_id) = self.memberships.remove(&client_id) else {
            return;
        };
        if let Some(force) =
            self.sessions.get_mut(&session_id).and_then(|session| session.release_role(client_id))
        {
            info!("{force:?} seat in session {session_id} is free again");
        }
    }

    pub fn on_move_attempt(&mut self, client_id: ClientId, mv: MoveRequest) -> MoveOutcome {
        let Some(session_id) = self.memberships.get(&client_id).cloned() else {
            warn!("Move from unknown client {client_id:?}: {mv:?}");
            return MoveOutcome::Ignored;
        };
        let Some(session) = self.sessions.get_mut(&session_id) else {
            warn!("Client {client_id:?} belongs to missing session {session_id}");
            return MoveOutcome::Ignored;
        };
        let clients = self.clients.lock().unwrap();

        let expected = self.engine.side_to_move(session.position());
        if session.role_holder(expected) != Some(client_id) {
            debug!("Out-of-turn move from {client_id:?} in session {session_id}: {mv:?}");
            return match self.options.out_of_turn_policy {
                OutOfTurnPolicy::Ignore => MoveOutcome::Ignored,
                OutOfTurnPolicy::Reject => {
                    clients.send(client_id, ChessServerEvent::InvalidMove(mv));
                    MoveOutcome::Rejected(MoveRejection::Illegal(TurnError::WrongTurnOrder))
                }
            };
        }

        match self.engine.apply(session.position(), &mv) {
            Err(rejection) => {
                debug!("Rejected move {mv:?} in session {session_id}: {rejection}");
                clients.send(client_id, ChessServerEvent::InvalidMove(mv));
                MoveOutcome::Rejected(rejection)
            }
            Ok(new_position) => {
                let board_state = self.engine.serialize(&new_position);
                session.set_position(new_position);
                let members = self
                    .memberships
                    .iter()
                    .filter(|(_, s)| **s == session_id)
                    .map(|(&id, _)| id)
                    .collect::<Vec<_>>();
                clients.send_to_all(&members, &ChessServerEvent::Move(mv));
                clients.send_to_all(&members, &ChessServerEvent::BoardState(board_state));
                MoveOutcome::Applied
            }
        }
    }
}
