//! Round state machine
//!
//! [`State`] drives a protocol that consists of a fixed sequence of rounds. Each round (except the
//! first one) expects exactly one message of a certain type from every other participant. The
//! state buffers messages that arrive early, discards those that arrive late, and hands the round
//! its inputs once all of them are present.
//!
//! Result of the protocol is published into an output cell shared between the state and any
//! number of [`Output`] handles. The cell is closed exactly once: with the output, with the first
//! fatal error, on timeout, or when the state is cancelled or dropped.

use alloc::{boxed::Box, collections::BTreeMap, collections::VecDeque, sync::Arc, vec::Vec};
use core::time::Duration;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::{
    error::{Error, InvalidParameters, UnexpectedMessage},
    messages::{Message, MessageType},
    PartyId, PartyIdList,
};

/// Single round of a protocol
///
/// Round receives exactly one message from every other participant via `process_message`, then
/// `generate_messages` is called once, then the round is consumed by `next_round`.
pub(crate) trait Round<O>: Send {
    /// Processes a message received in this round
    fn process_message(&mut self, msg: Message) -> Result<(), Error>;
    /// Produces messages to be sent to other parties once all messages are processed
    fn generate_messages(&mut self) -> Result<Vec<Message>, Error>;
    /// Completes the round
    fn next_round(self: Box<Self>) -> Result<NextRound<O>, Error>;
}

/// What comes after a round
pub(crate) enum NextRound<O> {
    /// Protocol proceeds to the next round
    Continue(Box<dyn Round<O>>),
    /// Protocol is completed
    Finish(O),
}

enum Status<O> {
    Running,
    Done(Result<O, Error>),
}

impl<O> Status<O> {
    fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Current round, shared with the timeout task so it can wipe secrets when it fires
type RoundSlot<O> = Arc<Mutex<Option<Box<dyn Round<O>>>>>;

fn lock<O>(slot: &RoundSlot<O>) -> MutexGuard<'_, Option<Box<dyn Round<O>>>> {
    // round is always left in a consistent state, poisoning can be ignored
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Output cell that can be closed only once
struct OutputCell<O> {
    tx: watch::Sender<Status<O>>,
}

impl<O> OutputCell<O> {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(Status::Running);
        Self { tx }
    }

    /// Stores the result and wakes up waiters
    ///
    /// Returns `false` if the cell was already closed, in which case `result` is discarded.
    fn close(&self, result: Result<O, Error>) -> bool {
        self.tx.send_if_modified(move |status| match status {
            Status::Running => {
                *status = Status::Done(result);
                true
            }
            Status::Done(_) => false,
        })
    }

    fn is_closed(&self) -> bool {
        self.tx.borrow().is_done()
    }

    fn subscribe(&self) -> watch::Receiver<Status<O>> {
        self.tx.subscribe()
    }
}

/// Protocol executed by a single party
///
/// `O` is the output of the protocol.
pub struct State<O> {
    id: PartyId,
    participants: PartyIdList,
    protocol: &'static [MessageType],
    /// Message types yet to be accepted, the head is the type of the current round. `None`
    /// stands for a round that takes no input.
    accepted: VecDeque<Option<MessageType>>,
    current: BTreeMap<PartyId, Message>,
    queue: Vec<Message>,
    round: RoundSlot<O>,
    cell: Arc<OutputCell<O>>,
    timer: Option<tokio::task::JoinHandle<()>>,
}

impl<O> State<O>
where
    O: Clone + Send + Sync + 'static,
{
    /// Constructs a state
    ///
    /// `protocol` lists message types in the order they're consumed; the first round takes no
    /// input. Non-zero `timeout` requires a tokio runtime to be available.
    pub(crate) fn new(
        id: PartyId,
        participants: PartyIdList,
        protocol: &'static [MessageType],
        first_round: Box<dyn Round<O>>,
        timeout: Duration,
    ) -> Result<(Self, Output<O>), InvalidParameters> {
        if !participants.contains(id) {
            return Err(InvalidParameters::NotAParticipant(id));
        }

        let cell = Arc::new(OutputCell::new());
        let round: RoundSlot<O> = Arc::new(Mutex::new(Some(first_round)));
        let timer = if timeout.is_zero() {
            None
        } else {
            let runtime =
                tokio::runtime::Handle::try_current().map_err(|_| InvalidParameters::NoRuntime)?;
            let cell = cell.clone();
            let round = round.clone();
            Some(runtime.spawn(async move {
                tokio::time::sleep(timeout).await;
                // slot stays locked until the cell is closed, so waiters never observe the
                // round after the timeout
                let mut round = lock(&round);
                if cell.close(Err(Error::Timeout)) {
                    *round = None;
                    tracing::warn!(party = %id, ?timeout, "protocol timed out");
                }
            }))
        };

        let accepted = core::iter::once(None)
            .chain(protocol.iter().copied().map(Some))
            .collect();
        let output = Output {
            rx: cell.subscribe(),
        };

        Ok((
            Self {
                id,
                participants,
                protocol,
                accepted,
                current: BTreeMap::new(),
                queue: Vec::new(),
                round,
                cell,
                timer,
            },
            output,
        ))
    }

    /// Identifier of the party running the protocol
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// Participants of the protocol, including this party
    pub fn participants(&self) -> &PartyIdList {
        &self.participants
    }

    /// Indicates whether the protocol is terminated
    pub fn is_finished(&self) -> bool {
        self.cell.is_closed() || lock(&self.round).is_none()
    }

    /// Returns a new handle to the output of the protocol
    pub fn output(&self) -> Output<O> {
        Output {
            rx: self.cell.subscribe(),
        }
    }

    /// Accepts a message received from another party
    ///
    /// Message is stored until its round comes. Messages sent by this party, addressed to another
    /// party, or belonging to an already completed round are silently discarded.
    ///
    /// Returned errors are local: the message is rejected, but the protocol carries on.
    pub fn handle_message(&mut self, msg: Message) -> Result<(), Error> {
        self.reset_if_closed();
        if lock(&self.round).is_none() {
            return Err(Error::AlreadyFinished);
        }

        let ty = msg.ty();
        if msg.from == self.id {
            tracing::warn!(party = %self.id, ?ty, "discarding message sent by ourselves");
            return Ok(());
        }
        if msg.to.is_some_and(|to| to != self.id) {
            tracing::warn!(party = %self.id, from = %msg.from, ?ty, "discarding message addressed to another party");
            return Ok(());
        }
        if !self.participants.contains(msg.from) {
            return Err(UnexpectedMessage::UnknownSender(msg.from).into());
        }
        if !self.protocol.contains(&ty) {
            return Err(UnexpectedMessage::WrongProtocol(ty).into());
        }

        let duplicate = if self.accepted.front() == Some(&Some(ty)) {
            self.current.contains_key(&msg.from)
        } else {
            self.queue
                .iter()
                .any(|queued| queued.from == msg.from && queued.ty() == ty)
        };
        if duplicate {
            return Err(UnexpectedMessage::Duplicate { from: msg.from, ty }.into());
        }

        if self.accepted.front() == Some(&Some(ty)) {
            tracing::trace!(party = %self.id, from = %msg.from, ?ty, "message accepted");
            self.current.insert(msg.from, msg);
        } else if self.accepted.iter().skip(1).any(|t| *t == Some(ty)) {
            tracing::trace!(party = %self.id, from = %msg.from, ?ty, "message queued");
            self.queue.push(msg);
        } else {
            tracing::warn!(party = %self.id, from = %msg.from, ?ty, "discarding message of completed round");
        }
        Ok(())
    }

    /// Advances the protocol as far as received messages allow
    ///
    /// Returns messages to be sent to other parties. Error returned from this method is fatal: the
    /// protocol is aborted and the error is published to the output.
    pub fn process_all(&mut self) -> Result<Vec<Message>, Error> {
        let slot = self.round.clone();
        let mut outgoing = Vec::new();
        loop {
            self.reset_if_closed();
            let mut round = lock(&slot);
            if round.is_none() || !self.is_round_complete() {
                break;
            }
            let result = self.advance(&mut round);
            drop(round);
            match result {
                Ok(msgs) => outgoing.extend(msgs),
                Err(err) => {
                    self.abort(err.clone());
                    return Err(err);
                }
            }
        }
        Ok(outgoing)
    }

    /// Waits until the protocol terminates
    ///
    /// Returns the error the protocol was terminated with, or `None` if it completed successfully.
    pub async fn wait_for_error(&self) -> Option<Error> {
        self.output().wait_for_error().await
    }

    /// Aborts the protocol
    ///
    /// Output is closed with [`Error::Cancelled`] unless the protocol is already terminated.
    pub fn cancel(&mut self) {
        self.abort(Error::Cancelled)
    }

    fn is_round_complete(&self) -> bool {
        match self.accepted.front() {
            Some(None) => true,
            Some(Some(_)) => self.current.len() + 1 == self.participants.len(),
            None => false,
        }
    }

    /// Completes the round held in `slot`, which must be locked for the whole call
    fn advance(&mut self, slot: &mut Option<Box<dyn Round<O>>>) -> Result<Vec<Message>, Error> {
        let mut round = slot.take().ok_or(Error::AlreadyFinished)?;
        for (_, msg) in core::mem::take(&mut self.current) {
            round.process_message(msg)?;
        }
        let outgoing = round.generate_messages()?;
        let completed = self.accepted.pop_front().flatten();

        match round.next_round()? {
            NextRound::Continue(next) => {
                tracing::debug!(party = %self.id, ?completed, next = ?self.accepted.front(), "round completed");
                *slot = Some(next);
                if let Some(Some(ty)) = self.accepted.front().copied() {
                    let (current, rest) = core::mem::take(&mut self.queue)
                        .into_iter()
                        .partition::<Vec<_>, _>(|msg| msg.ty() == ty);
                    self.queue = rest;
                    self.current
                        .extend(current.into_iter().map(|msg| (msg.from, msg)));
                }
            }
            NextRound::Finish(output) => {
                tracing::debug!(party = %self.id, "protocol completed");
                self.cell.close(Ok(output));
                self.clear();
            }
        }
        Ok(outgoing)
    }

    fn abort(&mut self, err: Error) {
        if self.cell.close(Err(err.clone())) {
            tracing::warn!(party = %self.id, %err, "protocol aborted");
        }
        self.reset();
    }

    /// Drops the round along with all secrets it holds
    fn reset(&mut self) {
        *lock(&self.round) = None;
        self.clear();
    }

    fn clear(&mut self) {
        self.accepted.clear();
        self.current.clear();
        self.queue.clear();
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Drops buffered messages left behind by the timeout task
    fn reset_if_closed(&mut self) {
        if !self.accepted.is_empty() && self.cell.is_closed() {
            tracing::debug!(party = %self.id, "output is closed, dropping buffered messages");
            self.reset();
        }
    }
}

impl<O> Drop for State<O> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        // aborted timer may still hold a reference to the slot
        *lock(&self.round) = None;
        if self.cell.close(Err(Error::Cancelled)) {
            tracing::warn!(party = %self.id, "state dropped before protocol completed");
        }
    }
}

/// Handle to the output of a protocol
///
/// Any number of handles can observe the same protocol; all of them see the same result.
pub struct Output<O> {
    rx: watch::Receiver<Status<O>>,
}

impl<O: Clone> Output<O> {
    /// Waits until the protocol terminates and returns its result
    pub async fn wait(&self) -> Result<O, Error> {
        let mut rx = self.rx.clone();
        let status = rx.wait_for(Status::is_done).await;
        match status.as_deref() {
            Ok(Status::Done(result)) => result.clone(),
            Ok(Status::Running) | Err(_) => Err(Error::Cancelled),
        }
    }

    /// Waits until the protocol terminates
    ///
    /// Returns the error the protocol was terminated with, or `None` if it completed successfully.
    pub async fn wait_for_error(&self) -> Option<Error> {
        self.wait().await.err()
    }

    /// Returns result of the protocol if it's terminated
    pub fn try_get(&self) -> Option<Result<O, Error>> {
        match &*self.rx.borrow() {
            Status::Done(result) => Some(result.clone()),
            Status::Running => None,
        }
    }

    /// Returns output of the protocol if it completed successfully
    pub fn get(&self) -> Option<O> {
        self.try_get().and_then(Result::ok)
    }
}

impl<O> Clone for Output<O> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<O> core::fmt::Debug for Output<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let status = if self.rx.borrow().is_done() {
            "done"
        } else {
            "running"
        };
        f.debug_struct("Output").field("status", &status).finish()
    }
}
