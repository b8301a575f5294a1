// Improvement potential. Switch from JSON to a binary format once the browser client is gone.

use std::io;
use std::net::TcpStream;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Serialize, de};
use tungstenite::{Message, WebSocket, protocol::Role};


pub const DEFAULT_PORT: u16 = 3000;


#[derive(Debug)]
pub enum CommunicationError {
    Socket(tungstenite::Error),
    Serde(serde_json::Error),
    ConnectionClosed,
    Protocol(String),
}

fn socket_error(err: tungstenite::Error) -> CommunicationError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            CommunicationError::ConnectionClosed
        }
        err => CommunicationError::Socket(err),
    }
}

fn serialize_obj(obj: &impl Serialize) -> Result<Message, CommunicationError> {
    let serialized = serde_json::to_string(obj).map_err(CommunicationError::Serde)?;
    Ok(Message::Text(serialized.into()))
}

// Returns `None` for control frames: they carry no payload for us, but still prove that the peer
// is alive.
pub fn decode_message<T: de::DeserializeOwned>(msg: Message) -> Result<Option<T>, CommunicationError> {
    match msg {
        Message::Text(text) => serde_json::from_str(text.as_str())
            .map(Some)
            .map_err(CommunicationError::Serde),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
        Message::Close(_) => Err(CommunicationError::ConnectionClosed),
        Message::Binary(_) => {
            Err(CommunicationError::Protocol("expected text, got binary message".to_owned()))
        }
    }
}

pub fn write_obj<T, S>(socket: &mut WebSocket<S>, obj: &T) -> Result<(), CommunicationError>
where
    T: Serialize,
    S: io::Read + io::Write,
{
    socket.send(serialize_obj(obj)?).map_err(socket_error)
}

pub fn read_obj<T, S>(socket: &mut WebSocket<S>) -> Result<T, CommunicationError>
where
    T: de::DeserializeOwned,
    S: io::Read + io::Write,
{
    loop {
        let msg = socket.read().map_err(socket_error)?;
        if let Some(obj) = decode_message(msg)? {
            return Ok(obj);
        }
    }
}

pub async fn write_obj_async<T, S>(sink: &mut S, obj: &T) -> Result<(), CommunicationError>
where
    T: Serialize,
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    sink.send(serialize_obj(obj)?).await.map_err(socket_error)
}

pub async fn write_ping_async<S>(sink: &mut S) -> Result<(), CommunicationError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    sink.send(Message::Ping(Vec::new().into())).await.map_err(socket_error)
}

// Reads the next frame of any kind, so that the caller can treat pongs as signs of life.
pub async fn read_message_async<S>(stream: &mut S) -> Result<Message, CommunicationError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    match stream.next().await {
        Some(Ok(msg)) => Ok(msg),
        Some(Err(err)) => Err(socket_error(err)),
        None => Err(CommunicationError::ConnectionClosed),
    }
}


// Improvement potential. Instead of cloning the socket, consider calling
//   `TcpStream::set_nonblocking` on the underlying stream and doing reads and writes
//   in the same thread.
pub fn clone_websocket(socket: &WebSocket<TcpStream>, role: Role) -> io::Result<WebSocket<TcpStream>> {
    let stream = socket.get_ref().try_clone()?;
    Ok(WebSocket::from_raw_socket(stream, role, None))
}
