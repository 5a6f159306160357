//! One table as a tokio task.
//!
//! The actor owns its [`Table`] outright. Client actions, seat events and
//! scheduler ticks all arrive through the same inbox and are handled one at
//! a time, so each action is fully applied before the next one is read.

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::config::ServiceConfig;
use crate::core::{ActionRequest, Seat, TableId, TableRng};
use crate::error::{MahjongError, MahjongResult};
use crate::protocol::{ClientMessage, SeatEvent, ServerMessage, TableSnapshot};
use crate::scheduler::{SeatPolicy, TurnTimer};
use crate::table::{Table, TableEvent};

/// Mixed into the table seed for the bots' stream.
const BOT_STREAM: u64 = 0x6d61_686a_6f6e_67;

/// Commands accepted by a [`TableActor`].
#[derive(Debug)]
pub enum TableCommand {
    Action {
        request: ActionRequest,
        reply: oneshot::Sender<MahjongResult<()>>,
    },
    Seat {
        event: SeatEvent,
        reply: oneshot::Sender<MahjongResult<()>>,
    },
    Subscribe {
        viewer: Option<Seat>,
        sender: mpsc::Sender<ServerMessage>,
    },
    Snapshot {
        viewer: Option<Seat>,
        reply: oneshot::Sender<MahjongResult<TableSnapshot>>,
    },
    Close {
        reason: String,
    },
}

/// Cheap cloneable sender for one table.
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableCommand>,
    table_id: TableId,
    observer_capacity: usize,
}

impl TableHandle {
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// The actor has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, command: TableCommand) -> MahjongResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| MahjongError::TableClosed(self.table_id))
    }

    async fn ask<T>(&self, command: TableCommand, reply: oneshot::Receiver<T>) -> MahjongResult<T> {
        self.send(command).await?;
        reply
            .await
            .map_err(|_| MahjongError::TableClosed(self.table_id))
    }

    /// Submit an action. A rejection comes back to the caller and goes out
    /// as [`ServerMessage::Rejected`] to observers viewing from that seat.
    pub async fn submit(&self, request: ActionRequest) -> MahjongResult<()> {
        let (reply, rx) = oneshot::channel();
        self.ask(TableCommand::Action { request, reply }, rx).await?
    }

    pub async fn update_seat(&self, event: SeatEvent) -> MahjongResult<()> {
        let (reply, rx) = oneshot::channel();
        self.ask(TableCommand::Seat { event, reply }, rx).await?
    }

    pub async fn dispatch(&self, message: ClientMessage) -> MahjongResult<()> {
        match message {
            ClientMessage::Action(request) => self.submit(request).await,
            ClientMessage::Seat(event) => self.update_seat(event).await,
        }
    }

    pub async fn snapshot(&self, viewer: Option<Seat>) -> MahjongResult<TableSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.ask(TableCommand::Snapshot { viewer, reply }, rx).await?
    }

    /// Receive a snapshot now and after every change, as seen by `viewer`.
    /// A viewer that is not a seat gets a single `Rejected` message.
    pub async fn subscribe(
        &self,
        viewer: Option<Seat>,
    ) -> MahjongResult<mpsc::Receiver<ServerMessage>> {
        let (sender, receiver) = mpsc::channel(self.observer_capacity);
        self.send(TableCommand::Subscribe { viewer, sender }).await?;
        Ok(receiver)
    }

    /// Stop the table. Commands still queued are dropped.
    pub async fn close(&self, reason: impl Into<String>) -> MahjongResult<()> {
        self.send(TableCommand::Close {
            reason: reason.into(),
        })
        .await
    }
}

struct Observer {
    viewer: Option<Seat>,
    sender: mpsc::Sender<ServerMessage>,
}

/// Runs one table until it is closed or every handle is dropped.
pub struct TableActor {
    table: Table,
    timer: TurnTimer,
    policy: Box<dyn SeatPolicy>,
    rng: TableRng,
    inbox: mpsc::Receiver<TableCommand>,
    observers: Vec<Observer>,
    tick: Duration,
    closed: Option<String>,
}

impl TableActor {
    /// Wrap `table`. Spawn [`TableActor::run`] to start it.
    pub fn new(
        table: Table,
        seed: u64,
        config: &ServiceConfig,
        policy: Box<dyn SeatPolicy>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);
        let table_id = table.id();
        let actor = Self {
            timer: TurnTimer::new(table_id, config.scheduler()),
            table,
            policy,
            rng: TableRng::new(seed ^ BOT_STREAM),
            inbox,
            observers: Vec::new(),
            tick: config.tick(),
            closed: None,
        };
        let handle = TableHandle {
            sender,
            table_id,
            observer_capacity: config.observer_capacity,
        };
        (actor, handle)
    }

    pub async fn run(mut self) {
        let id = self.table.id();
        info!("{} starting", id);
        self.timer.observe(Instant::now(), &self.table);

        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        self.closed = Some("all handles dropped".into());
                    }
                },
                _ = ticker.tick() => self.on_tick(),
            }
            if self.closed.is_some() {
                break;
            }
        }

        let reason = self.closed.take().unwrap_or_default();
        self.inbox.close();
        let message = ServerMessage::TableClosed {
            table_id: id,
            reason: reason.clone(),
        };
        for observer in &self.observers {
            // Closed receivers are fine here.
            let _ = observer.sender.try_send(message.clone());
        }
        info!("{} closed: {}", id, reason);
    }

    fn handle(&mut self, command: TableCommand) {
        match command {
            TableCommand::Action { request, reply } => {
                let result = self.apply(&request);
                if let Err(err) = &result {
                    self.notify_rejection(request.seat, err);
                }
                let _ = reply.send(result);
            }
            TableCommand::Seat { event, reply } => {
                let result = self.seat_event(&event);
                if let Err(err) = &result {
                    self.notify_rejection(event.seat, err);
                }
                let _ = reply.send(result);
            }
            TableCommand::Subscribe { viewer, sender } => {
                match TableSnapshot::capture(&self.table, viewer) {
                    Ok(snapshot) => {
                        if sender.try_send(ServerMessage::Snapshot(Box::new(snapshot))).is_ok() {
                            debug!("{} observer added for {:?}", self.table.id(), viewer);
                            self.observers.push(Observer { viewer, sender });
                        }
                    }
                    Err(err) => {
                        warn!("{} observer refused for {:?}: {}", self.table.id(), viewer, err);
                        let _ = sender.try_send(ServerMessage::rejected(self.table.id(), &err));
                    }
                }
            }
            TableCommand::Snapshot { viewer, reply } => {
                let _ = reply.send(TableSnapshot::capture(&self.table, viewer));
            }
            TableCommand::Close { reason } => {
                self.closed = Some(reason);
            }
        }
    }

    fn seat_event(&mut self, event: &SeatEvent) -> MahjongResult<()> {
        if event.table_id != self.table.id() {
            return Err(MahjongError::TableNotFound(event.table_id));
        }
        self.table.update_seat(event.seat, event.occupant.clone())?;
        self.timer.observe(Instant::now(), &self.table);
        self.broadcast(&[]);
        Ok(())
    }

    fn apply(&mut self, request: &ActionRequest) -> MahjongResult<()> {
        match self.table.submit(request) {
            Ok(events) => {
                self.timer.observe(Instant::now(), &self.table);
                self.broadcast(&events);
                Ok(())
            }
            Err(err) if err.is_fatal() => {
                error!("{} stopping: {}", self.table.id(), err);
                self.closed = Some(err.to_string());
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Tell the observers watching from `seat` that its message was refused.
    fn notify_rejection(&self, seat: Seat, err: &MahjongError) {
        let message = ServerMessage::rejected(self.table.id(), err);
        for observer in self.observers.iter().filter(|o| o.viewer == Some(seat)) {
            if observer.sender.try_send(message.clone()).is_err() {
                debug!("{} rejection for {} not delivered", self.table.id(), seat);
            }
        }
    }

    fn on_tick(&mut self) {
        let requests = self.timer.tick(
            Instant::now(),
            &self.table,
            self.policy.as_ref(),
            &mut self.rng,
        );
        for request in requests {
            if self.closed.is_some() {
                break;
            }
            // Several defaults can be due at once and the first may settle
            // the decision for the rest.
            if let Err(err) = self.apply(&request) {
                debug!("{} scheduled {} {} dropped: {}", self.table.id(), request.seat, request.kind, err);
            }
        }
    }

    /// Send every observer its view of the table plus any round results.
    fn broadcast(&mut self, events: &[TableEvent]) {
        let table = &self.table;
        let table_id = table.id();
        self.observers.retain(|observer| {
            let snapshot = match TableSnapshot::capture(table, observer.viewer) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!("{} dropping observer {:?}: {}", table_id, observer.viewer, err);
                    return false;
                }
            };
            let mut messages = vec![ServerMessage::Snapshot(Box::new(snapshot))];
            for event in events {
                match event {
                    TableEvent::Settled(settlement) => {
                        messages.push(ServerMessage::Settlement(settlement.clone()));
                    }
                    TableEvent::GameEnded(result) => {
                        messages.push(ServerMessage::GameResult(result.clone()));
                    }
                    TableEvent::ActionApplied(_) | TableEvent::RoundStarted { .. } => {}
                }
            }
            for message in messages {
                match observer.sender.try_send(message) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("{} observer {:?} is full, dropping a message", table_id, observer.viewer);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("{} observer {:?} went away", table_id, observer.viewer);
                        return false;
                    }
                }
            }
            true
        });
    }
}
