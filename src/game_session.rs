use enum_map::{EnumMap, enum_map};
use strum::IntoEnumIterator;

use crate::force::Force;
use crate::rules_engine::RulesEngine;
use crate::server::ClientId;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoleAssignment {
    Player(Force),
    Spectator,
}

// One game: the authoritative position and the two seats.
#[derive(Debug)]
pub struct GameSession<P> {
    position: P,
    roles: EnumMap<Force, Option<ClientId>>,
}

impl<P: Clone> GameSession<P> {
    pub fn new<E: RulesEngine<Position = P>>(engine: &E) -> Self {
        GameSession {
            position: engine.starting_position(),
            roles: enum_map! { _ => None },
        }
    }

    pub fn position(&self) -> &P { &self.position }
    pub fn set_position(&mut self, position: P) { self.position = position; }

    pub fn role_holder(&self, force: Force) -> Option<ClientId> { self.roles[force] }

    pub fn role_of(&self, client_id: ClientId) -> RoleAssignment {
        match Force::iter().find(|&force| self.roles[force] == Some(client_id)) {
            Some(force) => RoleAssignment::Player(force),
            None => RoleAssignment::Spectator,
        }
    }

    // White first, then Black. Spectators never get promoted later: a freed seat goes to
    // whoever connects next.
    pub fn assign_role(&mut self, client_id: ClientId) -> RoleAssignment {
        for force in Force::iter() {
            if self.roles[force].is_none() {
                self.roles[force] = Some(client_id);
                return RoleAssignment::Player(force);
            }
        }
        RoleAssignment::Spectator
    }

    // Returns the seat the client held, if any.
    pub fn release_role(&mut self, client_id: ClientId) -> Option<Force> {
        let force = Force::iter().find(|&force| self.roles[force] == Some(client_id))?;
        self.roles[force] = None;
        Some(force)
    }
}
