// Wire protocol. Serialized with serde's default (externally tagged) enum representation,
// e.g. `{"playerRole":"White"}`, `"spectatorRole"`, `{"boardState":"<FEN>"}`.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::force::Force;
use crate::once_cell_regex;


// A move exactly as the client sent it. Squares stay unparsed strings so that a malformed
// request can be echoed back verbatim in `InvalidMove`.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(from = "WireMove")]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

// Any `move` payload decodes. Missing or non-string squares become empty strings, a
// non-string promotion becomes "?"; the engine rejects both as malformed.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireMove {
    Fields {
        #[serde(default)]
        from: Option<WireString>,
        #[serde(default)]
        to: Option<WireString>,
        #[serde(default)]
        promotion: Option<WireString>,
    },
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireString {
    Text(String),
    Other(IgnoredAny),
}

impl From<WireMove> for MoveRequest {
    fn from(wire: WireMove) -> Self {
        let square = |s: Option<WireString>| match s {
            Some(WireString::Text(s)) => s,
            Some(WireString::Other(_)) | None => String::new(),
        };
        match wire {
            WireMove::Fields { from, to, promotion } => MoveRequest {
                from: square(from),
                to: square(to),
                promotion: promotion.map(|p| match p {
                    WireString::Text(s) => s,
                    WireString::Other(_) => "?".to_owned(),
                }),
            },
            WireMove::Other(_) => MoveRequest::default(),
        }
    }
}

impl MoveRequest {
    pub fn new(from: &str, to: &str) -> Self {
        MoveRequest {
            from: from.to_owned(),
            to: to.to_owned(),
            promotion: None,
        }
    }
    pub fn with_promotion(from: &str, to: &str, promotion: &str) -> Self {
        MoveRequest {
            promotion: Some(promotion.to_owned()),
            ..Self::new(from, to)
        }
    }

    // Parses coordinate notation: "e2e4", "e7e8q". Whitespace around the move is allowed.
    pub fn from_coordinate_notation(notation: &str) -> Option<Self> {
        let re = once_cell_regex!(r"^([a-hA-H][1-8])([a-hA-H][1-8])([qrbnQRBN])?$");
        let caps = re.captures(notation.trim())?;
        Some(MoveRequest {
            from: caps[1].to_ascii_lowercase(),
            to: caps[2].to_ascii_lowercase(),
            promotion: caps.get(3).map(|m| m.as_str().to_ascii_lowercase()),
        })
    }

    pub fn to_coordinate_notation(&self) -> String {
        format!("{}{}{}", self.from, self.to, self.promotion.as_deref().unwrap_or(""))
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChessServerEvent {
    // Sent only to the connecting client.
    PlayerRole(Force),
    // Sent instead of `PlayerRole` when both seats are taken.
    SpectatorRole,
    // Broadcast: echo of an accepted move.
    Move(MoveRequest),
    // Broadcast after every accepted move (and to each newcomer): authoritative position as FEN.
    BoardState(String),
    // Sent only to the client whose move was rejected.
    InvalidMove(MoveRequest),
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChessClientEvent {
    Move(MoveRequest),
}
