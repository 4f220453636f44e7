use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use felt_ai::{create_ai, decide_with_fallback, BotStrategy, DecisionRng};
use felt_engine::player::{Action, PlayerProfile};
use felt_engine::snapshot::TableSnapshot;
use felt_engine::table::{ActionOutcome, HandResult, Table};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::{ErrorSeverity, SessionError, TransportError};
use crate::events::{EventBus, EventSubscription, TableEvent};
use crate::remote::{RemoteEvent, RemoteReply, RemoteRequest, RemoteTransport};
use crate::scheduler::BotScheduler;
use crate::settings::{SessionSettings, SettingsStore};

/// Which side currently owns the table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Embedded,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SeatClaim {
    profile: PlayerProfile,
    stack: u32,
    is_bot: bool,
}

/// A caller request, kept whole so it can be replayed locally after the
/// remote session drops it.
#[derive(Debug, Clone)]
enum Op {
    Seat {
        seat: usize,
        claim: SeatClaim,
    },
    Start,
    Act {
        seat: usize,
        action: Action,
    },
}

impl Op {
    fn to_request(&self) -> RemoteRequest {
        match self {
            Op::Seat { seat, claim } => RemoteRequest::TakeSeat {
                seat: *seat,
                profile: claim.profile.clone(),
                stack: claim.stack,
                is_bot: claim.is_bot,
            },
            Op::Start => RemoteRequest::Start,
            Op::Act { seat, action } => RemoteRequest::SubmitAction {
                seat: *seat,
                action: *action,
            },
        }
    }
}

struct RemoteLink {
    link_id: Uuid,
    table_id: Option<String>,
    transport: Arc<dyn RemoteTransport>,
    mirror: Option<TableSnapshot>,
    listener: Option<JoinHandle<()>>,
}

enum Mode {
    Embedded(Box<Table>),
    Remote(RemoteLink),
}

struct AdapterState {
    mode: Mode,
    /// Settings the running table uses.
    settings: SessionSettings,
    settings_dirty: bool,
    bot: Box<dyn BotStrategy>,
    rng: DecisionRng,
    /// Seat whose hole cards observers may see.
    viewer: Option<usize>,
    seated: BTreeMap<usize, SeatClaim>,
    scheduler: BotScheduler,
    shut_down: bool,
}

struct Inner {
    state: Mutex<AdapterState>,
    bus: EventBus,
    requested: SettingsStore,
}

/// Front door to one table, local or remote.
///
/// Callers use the same operations in both modes. In embedded mode the table
/// lives in process and bot seats are played by a background task. In remote
/// mode requests are forwarded and the local state is a mirror of what the
/// remote session pushes. Any transport failure switches back to embedded
/// play from the last mirrored state and the interrupted request is replayed
/// locally.
///
/// ```rust
/// # tokio_test_block_on(async {
/// use felt_engine::player::PlayerProfile;
/// use felt_session::{SessionAdapter, SessionSettings};
///
/// let settings = SessionSettings { bot_think_delay_ms: 0, ..SessionSettings::default() };
/// let adapter = SessionAdapter::new(settings).unwrap();
/// adapter.seat_player(0, PlayerProfile::new("p1", "Alice"), false).await.unwrap();
/// adapter.seat_player(1, PlayerProfile::new("b1", "Bot"), true).await.unwrap();
/// adapter.start_hand().await.unwrap();
/// assert!(adapter.snapshot().await.unwrap().hand_number == 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct SessionAdapter {
    inner: Arc<Inner>,
}

impl SessionAdapter {
    pub fn new(settings: SessionSettings) -> Result<Self, SessionError> {
        let requested = SettingsStore::with_settings(settings.clone())?;
        let table = Table::new(settings.table.clone())?;
        let bot = create_ai(&settings.bot_strategy, settings.decision.clone())?;
        let rng = match settings.table.seed {
            Some(seed) => DecisionRng::seed_from_u64(seed.wrapping_add(1)),
            None => DecisionRng::from_os_rng(),
        };

        tracing::info!(
            max_seats = settings.table.max_seats,
            small_blind = settings.table.small_blind,
            big_blind = settings.table.big_blind,
            bot = bot.name(),
            "session created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(AdapterState {
                    mode: Mode::Embedded(Box::new(table)),
                    settings,
                    settings_dirty: false,
                    bot,
                    rng,
                    viewer: None,
                    seated: BTreeMap::new(),
                    scheduler: BotScheduler::new(),
                    shut_down: false,
                }),
                bus: EventBus::new(),
                requested,
            }),
        })
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.inner.bus.subscribe()
    }

    pub async fn mode(&self) -> SessionMode {
        match self.inner.state.lock().await.mode {
            Mode::Embedded(_) => SessionMode::Embedded,
            Mode::Remote(_) => SessionMode::Remote,
        }
    }

    /// Identifier of the remote table while connected.
    pub async fn remote_table_id(&self) -> Option<String> {
        match &self.inner.state.lock().await.mode {
            Mode::Remote(link) => link.table_id.clone(),
            Mode::Embedded(_) => None,
        }
    }

    /// Settings the table is playing under right now.
    pub async fn settings(&self) -> SessionSettings {
        self.inner.state.lock().await.settings.clone()
    }

    /// Settings that will apply from the next hand on.
    pub fn requested_settings(&self) -> Result<SessionSettings, SessionError> {
        Ok(self.inner.requested.get()?)
    }

    /// Seats a player with the configured starting stack.
    pub async fn seat_player(
        &self,
        seat: usize,
        profile: PlayerProfile,
        is_bot: bool,
    ) -> Result<(), SessionError> {
        let stack = self.inner.state.lock().await.settings.starting_stack;
        self.seat_player_with_stack(seat, profile, stack, is_bot).await
    }

    pub async fn seat_player_with_stack(
        &self,
        seat: usize,
        profile: PlayerProfile,
        stack: u32,
        is_bot: bool,
    ) -> Result<(), SessionError> {
        let claim = SeatClaim {
            profile,
            stack,
            is_bot,
        };
        self.perform(Op::Seat { seat, claim }).await
    }

    pub async fn start_hand(&self) -> Result<(), SessionError> {
        self.perform(Op::Start).await
    }

    pub async fn submit_action(&self, seat: usize, action: Action) -> Result<(), SessionError> {
        self.perform(Op::Act { seat, action }).await
    }

    /// Current table view, with hidden hole cards removed.
    pub async fn snapshot(&self) -> Result<TableSnapshot, SessionError> {
        let state = self.inner.state.lock().await;
        match &state.mode {
            Mode::Embedded(table) => Ok(table.snapshot().redacted_for(state.viewer)),
            Mode::Remote(link) => match &link.mirror {
                Some(mirror) => Ok(mirror.redacted_for(state.viewer)),
                None => Ok(Table::new(state.settings.table.clone())?.snapshot()),
            },
        }
    }

    /// Records new settings. They apply immediately between hands and at the
    /// next `start_hand` otherwise.
    pub async fn update_settings(&self, next: SessionSettings) -> Result<(), SessionError> {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        if state.shut_down {
            return Err(SessionError::ShutDown);
        }
        state.settings.check_compatible(&next)?;
        self.inner.requested.update(next)?;
        state.settings_dirty = true;

        let idle = matches!(&state.mode, Mode::Embedded(table) if !table.hand_in_progress());
        if idle {
            self.apply_pending_settings(state)?;
        } else {
            tracing::debug!("settings update deferred to the next hand");
        }
        Ok(())
    }

    /// Hands the table over to a remote session. Seats already taken locally
    /// are claimed remotely. Refused once any hand has been dealt.
    pub async fn connect_remote(
        &self,
        transport: Arc<dyn RemoteTransport>,
        table_id: Option<String>,
    ) -> Result<(), SessionError> {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        if state.shut_down {
            return Err(SessionError::ShutDown);
        }
        match &state.mode {
            Mode::Remote(_) => return Err(SessionError::AlreadyRemote),
            Mode::Embedded(table) if table.hand_number() > 0 => {
                return Err(SessionError::ModeSwitchRefused)
            }
            Mode::Embedded(_) => {}
        }

        let limit = state.settings.remote_timeout();
        let open = match &table_id {
            Some(id) => RemoteRequest::Join { table_id: id.clone() },
            None => RemoteRequest::Create {
                config: state.settings.table.clone(),
            },
        };
        let table_id = match round_trip(transport.as_ref(), open, limit).await? {
            RemoteReply::Created { table_id } => Some(table_id),
            RemoteReply::Accepted => table_id,
            RemoteReply::Rejected { reason } => return Err(SessionError::RemoteRejected(reason)),
        };

        for (seat, claim) in &state.seated {
            let op = Op::Seat {
                seat: *seat,
                claim: claim.clone(),
            };
            if let RemoteReply::Rejected { reason } =
                round_trip(transport.as_ref(), op.to_request(), limit).await?
            {
                return Err(SessionError::RemoteRejected(reason));
            }
        }

        let events = transport
            .take_events()
            .ok_or(TransportError::EventsUnavailable)?;
        let link_id = Uuid::new_v4();
        state.scheduler.bump();
        let listener = tokio::spawn(self.clone().listen(link_id, events));
        state.mode = Mode::Remote(RemoteLink {
            link_id,
            table_id: table_id.clone(),
            transport,
            mirror: None,
            listener: Some(listener),
        });

        tracing::info!(link_id = %link_id, table_id = ?table_id, "connected to remote session");
        Ok(())
    }

    /// Stops bot play and the remote listener. Later calls fail with
    /// [`SessionError::ShutDown`].
    pub async fn shutdown(&self) {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        state.scheduler.bump();
        if let Mode::Remote(link) = &mut state.mode {
            if let Some(listener) = link.listener.take() {
                listener.abort();
            }
        }
        tracing::info!("session shut down");
    }

    async fn perform(&self, op: Op) -> Result<(), SessionError> {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        if state.shut_down {
            return Err(SessionError::ShutDown);
        }

        let transport = match &state.mode {
            Mode::Remote(link) => Some(link.transport.clone()),
            Mode::Embedded(_) => None,
        };
        let result = match transport {
            None => self.apply_local(state, op),
            Some(transport) => {
                let limit = state.settings.remote_timeout();
                match round_trip(transport.as_ref(), op.to_request(), limit).await {
                    Ok(RemoteReply::Rejected { reason }) => {
                        Err(SessionError::RemoteRejected(reason))
                    }
                    Ok(_) => {
                        self.note_remote_success(state, &op);
                        Ok(())
                    }
                    Err(err) => {
                        tracing::warn!(
                            request = op.to_request().kind(),
                            error = %err,
                            "remote request failed, replaying locally"
                        );
                        self.fall_back(state, &err.to_string()).and_then(|()| {
                            let replayed = self.apply_local(state, op);
                            // The restored table may already be waiting on a
                            // bot, whether or not the replay went through.
                            self.kick_bots(state);
                            replayed
                        })
                    }
                }
            }
        };

        if let Err(err) = &result {
            err.log();
            if err.severity() == ErrorSeverity::Critical {
                self.publish_error(err);
            }
        }
        result
    }

    fn note_remote_success(&self, state: &mut AdapterState, op: &Op) {
        if let Op::Seat { seat, claim } = op {
            if !claim.is_bot && state.viewer.is_none() {
                state.viewer = Some(*seat);
            }
            state.seated.insert(*seat, claim.clone());
        }
    }

    /// Runs one request against the embedded table.
    fn apply_local(&self, state: &mut AdapterState, op: Op) -> Result<(), SessionError> {
        if matches!(op, Op::Start) {
            self.apply_pending_settings(state)?;
        }
        let Mode::Embedded(table) = &mut state.mode else {
            return Err(SessionError::AlreadyRemote);
        };

        match op {
            Op::Seat { seat, claim } => {
                table.seat_player(seat, claim.profile.clone(), claim.stack, claim.is_bot)?;
                if !claim.is_bot && state.viewer.is_none() {
                    state.viewer = Some(seat);
                }
                tracing::info!(
                    seat,
                    player = %claim.profile.display_name,
                    stack = claim.stack,
                    bot = claim.is_bot,
                    "player seated"
                );
                state.seated.insert(seat, claim);
                self.publish_state(table, state.viewer);
            }
            Op::Start => {
                table.start_hand()?;
                state.scheduler.bump();
                tracing::info!(
                    hand = table.hand_number(),
                    dealer = ?table.dealer_seat(),
                    "hand started"
                );
                self.publish_state(table, state.viewer);
                let hand_number = table.hand_number();
                if let Some(result) = table.last_result().filter(|r| r.hand_number == hand_number) {
                    // Blinds put everyone all-in and the board ran out.
                    self.publish_result(table, result);
                }
                self.kick_bots(state);
            }
            Op::Act { seat, action } => {
                let outcome = table.apply_action(seat, action)?;
                tracing::debug!(seat, %action, round = ?outcome.round, "action applied");
                self.publish_progress(table, state.viewer, &outcome);
                self.kick_bots(state);
            }
        }
        Ok(())
    }

    fn apply_pending_settings(&self, state: &mut AdapterState) -> Result<(), SessionError> {
        if !state.settings_dirty {
            return Ok(());
        }
        let next = self.inner.requested.get()?;
        if let Mode::Embedded(table) = &mut state.mode {
            table.set_blinds(next.table.small_blind, next.table.big_blind)?;
        }
        if next.decision != state.settings.decision
            || next.bot_strategy != state.settings.bot_strategy
        {
            state.bot = create_ai(&next.bot_strategy, next.decision.clone())?;
        }
        tracing::info!(
            small_blind = next.table.small_blind,
            big_blind = next.table.big_blind,
            think_delay_ms = next.bot_think_delay_ms,
            "applied updated settings"
        );
        state.settings = next;
        state.settings_dirty = false;
        Ok(())
    }

    /// Switches to embedded play from the last mirrored state. Does nothing
    /// when already embedded, so a session reports at most one fallback per
    /// remote connection.
    fn fall_back(&self, state: &mut AdapterState, reason: &str) -> Result<(), SessionError> {
        let Mode::Remote(link) = &mut state.mode else {
            return Ok(());
        };
        if let Some(listener) = link.listener.take() {
            listener.abort();
        }
        let link_id = link.link_id;
        let config = state.settings.table.clone();

        let restored = link.mirror.take().and_then(|mirror| {
            Table::restore(config.clone(), &mirror)
                .map_err(|err| {
                    tracing::error!(error = %err, "mirrored state could not be restored");
                })
                .ok()
        });
        let table = match restored {
            Some(table) => table,
            None => {
                let mut table = Table::new(config)?;
                for (seat, claim) in &state.seated {
                    table.seat_player(*seat, claim.profile.clone(), claim.stack, claim.is_bot)?;
                }
                table
            }
        };

        state.scheduler.bump();
        tracing::warn!(
            link_id = %link_id,
            reason,
            hand = table.hand_number(),
            "remote session lost, continuing locally"
        );
        self.inner.bus.publish(TableEvent::FallbackNotice {
            reason: reason.to_string(),
        });
        self.publish_state(&table, state.viewer);
        state.mode = Mode::Embedded(Box::new(table));
        Ok(())
    }

    async fn listen(self, link_id: Uuid, mut events: mpsc::Receiver<RemoteEvent>) {
        loop {
            let event = events.recv().await;
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            if state.shut_down {
                return;
            }
            let Mode::Remote(link) = &mut state.mode else {
                return;
            };
            if link.link_id != link_id {
                return;
            }

            let lost = match event {
                Some(RemoteEvent::StateUpdate { state: remote }) => {
                    match TableSnapshot::try_from(*remote) {
                        Ok(snapshot) => {
                            tracing::trace!(
                                hand = snapshot.hand_number,
                                round = ?snapshot.round,
                                "remote state mirrored"
                            );
                            self.inner.bus.publish(TableEvent::StateUpdated {
                                snapshot: Box::new(snapshot.redacted_for(state.viewer)),
                            });
                            link.mirror = Some(snapshot);
                            None
                        }
                        Err(err) => Some(err.to_string()),
                    }
                }
                Some(RemoteEvent::Message { text }) => {
                    self.inner.bus.publish(TableEvent::Message { text });
                    None
                }
                Some(RemoteEvent::Disconnected { reason }) => Some(reason),
                None => Some(TransportError::Disconnected.to_string()),
            };

            if let Some(reason) = lost {
                match self.fall_back(state, &reason) {
                    Ok(()) => self.kick_bots(state),
                    Err(err) => {
                        err.log();
                        self.publish_error(&err);
                    }
                }
                return;
            }
        }
    }

    /// Schedules bot play when a bot seat is due to act.
    fn kick_bots(&self, state: &mut AdapterState) {
        let Mode::Embedded(table) = &state.mode else {
            return;
        };
        let Some(seat) = table.acting_seat() else {
            return;
        };
        if !table.player(seat).is_some_and(|p| p.is_bot) {
            return;
        }
        let generation = state.scheduler.generation();
        let delay = state.settings.bot_think_delay();
        let adapter = self.clone();
        state
            .scheduler
            .spawn(async move { adapter.play_bots(generation, delay).await });
    }

    async fn play_bots(self, generation: u64, delay: Duration) {
        loop {
            tokio::time::sleep(delay).await;
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            if state.shut_down || !state.scheduler.is_current(generation) {
                return;
            }
            let Mode::Embedded(table) = &mut state.mode else {
                return;
            };
            let Some(seat) = table.acting_seat() else {
                return;
            };
            if !table.player(seat).is_some_and(|p| p.is_bot) {
                return;
            }

            let view = table.snapshot().redacted_for(Some(seat));
            let action = decide_with_fallback(state.bot.as_ref(), &view, seat, &mut state.rng);
            match table.apply_action(seat, action) {
                Ok(outcome) => {
                    tracing::debug!(seat, %action, round = ?outcome.round, "bot acted");
                    self.publish_progress(table, state.viewer, &outcome);
                }
                Err(err) => {
                    let err = SessionError::from(err);
                    err.log();
                    self.publish_error(&err);
                    return;
                }
            }
        }
    }

    fn publish_state(&self, table: &Table, viewer: Option<usize>) {
        self.inner.bus.publish(TableEvent::StateUpdated {
            snapshot: Box::new(table.snapshot().redacted_for(viewer)),
        });
    }

    fn publish_progress(&self, table: &Table, viewer: Option<usize>, outcome: &ActionOutcome) {
        self.publish_state(table, viewer);
        if let Some(result) = &outcome.hand_result {
            self.publish_result(table, result);
        }
    }

    fn publish_result(&self, table: &Table, result: &HandResult) {
        let mut winners: Vec<usize> = Vec::new();
        for award in &result.awards {
            if !winners.contains(&award.seat) {
                winners.push(award.seat);
            }
        }
        for seat in winners {
            let amount = result.total_won_by(seat);
            let text = match result.showdown.iter().find(|s| s.seat == seat) {
                Some(shown) => format!("Seat {seat} wins {amount} with {}", shown.hand.category),
                None => format!("Seat {seat} wins {amount}"),
            };
            tracing::info!(
                hand = result.hand_number,
                seat,
                amount,
                player = table.player(seat).map(|p| p.profile.display_name.as_str()),
                "pot awarded"
            );
            self.inner.bus.publish(TableEvent::Message { text });
        }
    }

    fn publish_error(&self, err: &SessionError) {
        self.inner.bus.publish(TableEvent::Error {
            code: err.error_code().to_string(),
            message: err.to_string(),
        });
    }
}

/// One bounded request. A timeout counts as a transport failure.
async fn round_trip(
    transport: &dyn RemoteTransport,
    request: RemoteRequest,
    limit: Duration,
) -> Result<RemoteReply, TransportError> {
    let kind = request.kind();
    match tokio::time::timeout(limit, transport.request(request)).await {
        Ok(reply) => {
            tracing::trace!(request = kind, ok = reply.is_ok(), "remote round trip");
            reply
        }
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}
