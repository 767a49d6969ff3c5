//! Running the protocol over a byte transport
//!
//! [`State`] works with typed [`Message`]s and never touches the network. This module glues it to
//! a transport that delivers opaque byte buffers: incoming bytes are decoded and fed into the
//! state, emitted messages are encoded and returned along with their recipient.
//!
//! [`Party`] is a synchronous wrapper suitable for any event loop. [`run`] drives the protocol to
//! completion over a [`Stream`] of incoming buffers and a [`Sink`] of outgoing ones.

use alloc::{boxed::Box, vec::Vec};

use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::{
    error::Error,
    messages::Message,
    state::{Output, State},
    PartyId,
};

/// Encoded message to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Recipient, `None` if the message must be delivered to every other participant
    pub to: Option<PartyId>,
    /// Serialized message
    pub bytes: Vec<u8>,
}

impl Outgoing {
    fn encode(msg: &Message) -> Self {
        Self {
            to: msg.to,
            bytes: msg.to_bytes(),
        }
    }

    /// Indicates whether the message is sent to all parties
    pub fn is_broadcast(&self) -> bool {
        self.to.is_none()
    }
}

/// Protocol state wrapped into the wire format
pub struct Party<O> {
    state: State<O>,
}

impl<O> Party<O>
where
    O: Clone + Send + Sync + 'static,
{
    /// Wraps the state
    pub fn new(state: State<O>) -> Self {
        Self { state }
    }

    /// Identifier of this party
    pub fn id(&self) -> PartyId {
        self.state.id()
    }

    /// Returns a handle to the output of the protocol
    pub fn output(&self) -> Output<O> {
        self.state.output()
    }

    /// Indicates whether the protocol is terminated
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Starts the protocol, returns messages of the first round
    pub fn start(&mut self) -> Result<Vec<Outgoing>, Error> {
        self.process()
    }

    /// Handles bytes received from the transport
    ///
    /// Returns messages to be sent in response, possibly none. Malformed and unexpected messages
    /// are rejected with an error, but the protocol carries on; use [`Error::is_fatal`] to tell
    /// whether the protocol is aborted.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Vec<Outgoing>, Error> {
        let msg = Message::from_bytes(bytes).map_err(|err| {
            tracing::warn!(party = %self.id(), %err, len = bytes.len(), "malformed message");
            Error::MalformedMessage(err)
        })?;
        let from = msg.from;
        self.state.handle_message(msg).map_err(|err| {
            tracing::warn!(party = %self.id(), %from, %err, "message rejected");
            err
        })?;
        self.process()
    }

    /// Aborts the protocol
    pub fn cancel(&mut self) {
        self.state.cancel()
    }

    /// Unwraps the state
    pub fn into_state(self) -> State<O> {
        self.state
    }

    fn process(&mut self) -> Result<Vec<Outgoing>, Error> {
        let msgs = self.state.process_all()?;
        Ok(msgs.iter().map(Outgoing::encode).collect())
    }
}

/// Runs the protocol to completion
///
/// Sends messages of the first round, then keeps feeding `incoming` buffers into the state and
/// sending emitted messages into `outgoing` until the output is available. Malformed and
/// unexpected messages are logged and skipped.
///
/// If `incoming` is exhausted before completion, the protocol is cancelled.
pub async fn run<O, I, S>(state: State<O>, incoming: I, mut outgoing: S) -> Result<O, RunError>
where
    O: Clone + Send + Sync + 'static,
    I: Stream<Item = Vec<u8>> + Unpin,
    S: Sink<Outgoing> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let mut party = Party::new(state);
    let output = party.output();
    let mut incoming = incoming.fuse();

    send_all(&mut outgoing, party.start().map_err(RunError::Protocol)?).await?;

    loop {
        if let Some(result) = output.try_get() {
            return result.map_err(RunError::Protocol);
        }

        tokio::select! {
            result = output.wait() => return result.map_err(RunError::Protocol),
            bytes = incoming.next() => {
                let Some(bytes) = bytes else {
                    tracing::warn!(party = %party.id(), "incoming stream ended before protocol completed");
                    party.cancel();
                    continue;
                };
                match party.handle_bytes(&bytes) {
                    Ok(msgs) => send_all(&mut outgoing, msgs).await?,
                    Err(err) if err.is_fatal() => return Err(RunError::Protocol(err)),
                    // already logged
                    Err(_) => (),
                }
            }
        }
    }
}

async fn send_all<S>(outgoing: &mut S, msgs: Vec<Outgoing>) -> Result<(), RunError>
where
    S: Sink<Outgoing> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    if msgs.is_empty() {
        return Ok(());
    }
    for msg in msgs {
        outgoing.feed(msg).await.map_err(RunError::send)?;
    }
    outgoing.flush().await.map_err(RunError::send)
}

/// Error of [`run`]
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Protocol failed
    #[error("protocol failed")]
    Protocol(#[source] Error),
    /// Couldn't send a message
    #[error("i/o error: send message")]
    Send(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RunError {
    fn send(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Send(Box::new(err))
    }
}
