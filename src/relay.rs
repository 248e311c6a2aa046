//! Request/response relay between the editor and the tile store.
//!
//! A background thread owns the store and services requests over a channel.
//! Each request carries its own reply sender and is answered exactly once: a
//! write is acknowledged with the fixed [`ACK`] token, a read returns the
//! current list. The editor only ever talks to [`RelayHandle`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::store::{StoreError, TileStore};
use crate::tiles::Tile;

/// Fixed acknowledgement token for a successful write.
pub const ACK: &str = "success";

#[derive(Debug)]
pub enum Request {
    /// Overwrite the persisted tile list wholesale.
    SetTiles(Vec<Tile>),
    /// Read the current persisted tile list.
    GetTiles,
}

#[derive(Debug)]
pub enum Response {
    Ack(&'static str),
    Tiles { data: Vec<Tile> },
    Failed(StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("tile relay is not running")]
    Disconnected,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unexpected relay response")]
    Protocol,
}

struct Envelope {
    request: Request,
    reply: Sender<Response>,
}

/// Client side of the relay channel.
#[derive(Clone)]
pub struct RelayHandle {
    tx: Sender<Envelope>,
}

impl RelayHandle {
    fn request(&self, request: Request) -> Result<Response, RelayError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .map_err(|_| RelayError::Disconnected)?;
        reply_rx.recv().map_err(|_| RelayError::Disconnected)
    }

    pub fn get_tiles(&self) -> Result<Vec<Tile>, RelayError> {
        match self.request(Request::GetTiles)? {
            Response::Tiles { data } => Ok(data),
            Response::Failed(err) => Err(err.into()),
            Response::Ack(_) => Err(RelayError::Protocol),
        }
    }

    pub fn set_tiles(&self, tiles: Vec<Tile>) -> Result<(), RelayError> {
        match self.request(Request::SetTiles(tiles))? {
            Response::Ack(token) if token == ACK => Ok(()),
            Response::Failed(err) => Err(err.into()),
            _ => Err(RelayError::Protocol),
        }
    }
}

/// Spawn the relay thread. The thread exits when every handle is dropped.
pub fn spawn(store: Box<dyn TileStore + Send>) -> RelayHandle {
    let (tx, rx) = mpsc::channel::<Envelope>();
    thread::spawn(move || serve(store.as_ref(), rx));
    RelayHandle { tx }
}

fn serve(store: &dyn TileStore, rx: Receiver<Envelope>) {
    while let Ok(Envelope { request, reply }) = rx.recv() {
        let response = handle(store, request);
        // The requester may already be gone; the request was still serviced.
        let _ = reply.send(response);
    }
}

/// Service a single request against the store.
pub fn handle(store: &dyn TileStore, request: Request) -> Response {
    match request {
        Request::SetTiles(tiles) => match store.set(&tiles) {
            Ok(()) => Response::Ack(ACK),
            Err(err) => Response::Failed(err),
        },
        Request::GetTiles => match store.get() {
            Ok(data) => Response::Tiles { data },
            Err(err) => Response::Failed(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldId;
    use crate::store::MemoryStore;

    fn sample_tiles() -> Vec<Tile> {
        vec![
            Tile::from_field(FieldId::ExactPhrase, "tile sync", None).unwrap(),
            Tile::from_field(FieldId::DateRange, "qdr:m", Some("Past month")).unwrap(),
        ]
    }

    #[test]
    fn test_write_acknowledges_with_fixed_token() {
        let store = MemoryStore::default();
        match handle(&store, Request::SetTiles(sample_tiles())) {
            Response::Ack(token) => assert_eq!(token, ACK),
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[test]
    fn test_read_returns_data_envelope() {
        let store = MemoryStore::with_tiles(sample_tiles());
        match handle(&store, Request::GetTiles) {
            Response::Tiles { data } => assert_eq!(data, sample_tiles()),
            other => panic!("expected tiles, got {other:?}"),
        }
    }

    #[test]
    fn test_handle_round_trip_over_thread() {
        let relay = spawn(Box::new(MemoryStore::default()));
        assert!(relay.get_tiles().unwrap().is_empty());
        relay.set_tiles(sample_tiles()).unwrap();
        assert_eq!(relay.get_tiles().unwrap(), sample_tiles());
    }

    #[test]
    fn test_last_writer_wins() {
        let relay = spawn(Box::new(MemoryStore::default()));
        relay.set_tiles(sample_tiles()).unwrap();
        relay.set_tiles(Vec::new()).unwrap();
        assert!(relay.get_tiles().unwrap().is_empty());
    }

    #[test]
    fn test_every_handle_reaches_the_same_store() {
        let relay = spawn(Box::new(MemoryStore::default()));
        let other = relay.clone();
        relay.set_tiles(sample_tiles()).unwrap();
        assert_eq!(other.get_tiles().unwrap(), sample_tiles());
    }
}
