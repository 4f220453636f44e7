/// Remote mode: request forwarding, mirrored state and the embedded fallback
use async_trait::async_trait;
use felt_engine::errors::GameError;
use felt_engine::player::{Action, PlayerProfile};
use felt_engine::snapshot::TableSnapshot;
use felt_engine::table::{BettingRound, Table, TableConfig};
use felt_session::{
    RemoteEvent, RemoteReply, RemoteRequest, RemoteTableState, RemoteTransport, SessionAdapter,
    SessionError, SessionMode, SessionSettings, TableEvent, TransportError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct FakeRemote {
    requests: Mutex<Vec<RemoteRequest>>,
    events: Mutex<Option<mpsc::Receiver<RemoteEvent>>>,
    failing: AtomicBool,
    hanging: AtomicBool,
    rejecting: AtomicBool,
}

impl FakeRemote {
    fn new() -> (Arc<Self>, mpsc::Sender<RemoteEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let remote = FakeRemote {
            events: Mutex::new(Some(rx)),
            ..FakeRemote::default()
        };
        (Arc::new(remote), tx)
    }

    fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTransport for FakeRemote {
    async fn request(&self, request: RemoteRequest) -> Result<RemoteReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Io("connection reset by peer".into()));
        }
        match request {
            RemoteRequest::Create { .. } => Ok(RemoteReply::Created {
                table_id: "remote-1".into(),
            }),
            RemoteRequest::SubmitAction { .. } if self.rejecting.load(Ordering::SeqCst) => {
                Ok(RemoteReply::Rejected {
                    reason: "not your turn".into(),
                })
            }
            _ => Ok(RemoteReply::Accepted),
        }
    }

    fn take_events(&self) -> Option<mpsc::Receiver<RemoteEvent>> {
        self.events.lock().unwrap().take()
    }
}

fn heads_up_settings() -> SessionSettings {
    SessionSettings {
        table: TableConfig {
            max_seats: 2,
            small_blind: 5,
            big_blind: 10,
            seed: Some(7),
        },
        bot_think_delay_ms: 0,
        remote_timeout_ms: 500,
        ..SessionSettings::default()
    }
}

fn alice() -> PlayerProfile {
    PlayerProfile::new("u-alice", "Alice")
}

fn bob() -> PlayerProfile {
    PlayerProfile::new("u-bob", "Bob")
}

/// What the remote session would push after dealing its first hand.
fn remote_hand_state() -> TableSnapshot {
    let mut table = Table::new(heads_up_settings().table).expect("table");
    table.seat_player(0, alice(), 1000, false).expect("seat");
    table.seat_player(1, bob(), 1000, false).expect("seat");
    table.start_hand().expect("start");
    table.snapshot().redacted_for(Some(0))
}

async fn connected() -> (SessionAdapter, Arc<FakeRemote>, mpsc::Sender<RemoteEvent>) {
    let adapter = SessionAdapter::new(heads_up_settings()).expect("adapter");
    adapter.seat_player(0, alice(), false).await.expect("seat alice");
    adapter.seat_player(1, bob(), false).await.expect("seat bob");
    let (remote, tx) = FakeRemote::new();
    adapter
        .connect_remote(remote.clone(), None)
        .await
        .expect("connect");
    (adapter, remote, tx)
}

async fn next_event(sub: &mut felt_session::EventSubscription) -> TableEvent {
    tokio::time::timeout(Duration::from_secs(5), sub.recv())
        .await
        .expect("event in time")
        .expect("bus open")
}

async fn push_state(tx: &mpsc::Sender<RemoteEvent>, snapshot: &TableSnapshot) {
    tx.send(RemoteEvent::StateUpdate {
        state: Box::new(RemoteTableState::from(snapshot)),
    })
    .await
    .expect("listener alive");
}

fn fallback_notices(events: &[TableEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, TableEvent::FallbackNotice { .. }))
        .count()
}

#[tokio::test]
async fn connecting_claims_seats_and_creates_table() {
    let (adapter, remote, _tx) = connected().await;

    assert_eq!(adapter.mode().await, SessionMode::Remote);
    assert_eq!(adapter.remote_table_id().await.as_deref(), Some("remote-1"));
    let requests = remote.requests();
    assert_eq!(requests.len(), 3);
    assert!(matches!(requests[0], RemoteRequest::Create { .. }));
    assert!(matches!(requests[1], RemoteRequest::TakeSeat { seat: 0, .. }));
    assert!(matches!(requests[2], RemoteRequest::TakeSeat { seat: 1, .. }));
}

#[tokio::test]
async fn pushed_state_replaces_the_mirror() {
    let (adapter, _remote, tx) = connected().await;
    let mut sub = adapter.subscribe();
    let pushed = remote_hand_state();

    push_state(&tx, &pushed).await;
    match next_event(&mut sub).await {
        TableEvent::StateUpdated { snapshot } => assert_eq!(*snapshot, pushed),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(adapter.snapshot().await.expect("snapshot"), pushed);

    tx.send(RemoteEvent::Message {
        text: "Bob joined".into(),
    })
    .await
    .expect("send");
    assert_eq!(
        next_event(&mut sub).await,
        TableEvent::Message {
            text: "Bob joined".into()
        }
    );
}

#[tokio::test]
async fn remote_failure_mid_action_falls_back_and_completes_locally() {
    let (adapter, remote, tx) = connected().await;
    let mut sub = adapter.subscribe();
    let pushed = remote_hand_state();
    push_state(&tx, &pushed).await;
    next_event(&mut sub).await;

    let seat = pushed.acting_seat.expect("someone to act");
    let other = 1 - seat;
    remote.failing.store(true, Ordering::SeqCst);

    adapter
        .submit_action(seat, Action::Call)
        .await
        .expect("action completes locally");

    assert_eq!(adapter.mode().await, SessionMode::Embedded);
    let snap = adapter.snapshot().await.expect("snapshot");
    assert_eq!(snap.hand_number, pushed.hand_number);
    assert_eq!(snap.round, BettingRound::Preflop);
    assert_eq!(snap.acting_seat, Some(other));
    assert_eq!(snap.player(seat).expect("seat").current_bet, 10);
    assert_eq!(snap.pot_total(), 20);
    assert!(matches!(
        remote.requests().last(),
        Some(RemoteRequest::SubmitAction { action: Action::Call, .. })
    ));

    // A late disconnect and further play do not announce a second fallback.
    let _ = tx
        .send(RemoteEvent::Disconnected {
            reason: "gone".into(),
        })
        .await;
    adapter
        .submit_action(other, Action::Check)
        .await
        .expect("local check");
    tokio::task::yield_now().await;

    let events = sub.drain();
    assert_eq!(fallback_notices(&events), 1);
    assert_eq!(
        adapter.snapshot().await.expect("snapshot").round,
        BettingRound::Flop
    );
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_times_out_into_fallback() {
    let (adapter, remote, tx) = connected().await;
    let mut sub = adapter.subscribe();
    let pushed = remote_hand_state();
    push_state(&tx, &pushed).await;
    next_event(&mut sub).await;

    remote.hanging.store(true, Ordering::SeqCst);
    let seat = pushed.acting_seat.expect("acting");
    adapter
        .submit_action(seat, Action::Fold)
        .await
        .expect("fold replayed locally");

    assert_eq!(adapter.mode().await, SessionMode::Embedded);
    let snap = adapter.snapshot().await.expect("snapshot");
    assert_eq!(snap.round, BettingRound::HandOver);
    let result = snap.last_result.expect("hand result");
    assert!(result.uncontested());
    assert_eq!(result.total_won_by(1 - seat), 15);

    let events = sub.drain();
    assert_eq!(fallback_notices(&events), 1);
    assert!(events.iter().any(
        |e| matches!(e, TableEvent::FallbackNotice { reason } if reason.contains("did not answer"))
    ));
}

#[tokio::test(start_paused = true)]
async fn bot_turn_resumes_after_fallback_rejects_the_replay() {
    let adapter = SessionAdapter::new(heads_up_settings()).expect("adapter");
    adapter.seat_player(0, alice(), false).await.expect("seat alice");
    adapter.seat_player(1, bob(), true).await.expect("seat bot");
    let (remote, tx) = FakeRemote::new();
    adapter
        .connect_remote(remote.clone(), None)
        .await
        .expect("connect");

    // The remote table has the bot in the big blind with the option.
    let mut table = Table::new(heads_up_settings().table).expect("table");
    table.seat_player(0, alice(), 1000, false).expect("seat");
    table.seat_player(1, bob(), 1000, true).expect("seat");
    table.start_hand().expect("start");
    table.apply_action(0, Action::Call).expect("limp");
    let pushed = table.snapshot().redacted_for(Some(0));
    assert_eq!(pushed.acting_seat, Some(1));

    let mut sub = adapter.subscribe();
    push_state(&tx, &pushed).await;
    next_event(&mut sub).await;

    remote.failing.store(true, Ordering::SeqCst);
    let err = adapter
        .submit_action(0, Action::Call)
        .await
        .expect_err("stale action is rejected locally");
    assert!(matches!(
        err,
        SessionError::Validation(GameError::NotPlayersTurn { actual: 0, .. })
    ));
    assert_eq!(adapter.mode().await, SessionMode::Embedded);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let snap = adapter.snapshot().await.expect("snapshot");
    assert!(snap.actions.len() > pushed.actions.len(), "bot never acted");
    assert!(snap.actions.iter().any(|a| a.seat == 1));
    assert_eq!(fallback_notices(&sub.drain()), 1);
}

#[tokio::test]
async fn disconnect_push_falls_back_with_mirrored_state() {
    let (adapter, _remote, tx) = connected().await;
    let mut sub = adapter.subscribe();
    let pushed = remote_hand_state();
    push_state(&tx, &pushed).await;
    next_event(&mut sub).await;

    tx.send(RemoteEvent::Disconnected {
        reason: "server restarting".into(),
    })
    .await
    .expect("send");

    assert_eq!(
        next_event(&mut sub).await,
        TableEvent::FallbackNotice {
            reason: "server restarting".into()
        }
    );
    assert_eq!(adapter.mode().await, SessionMode::Embedded);

    let snap = adapter.snapshot().await.expect("snapshot");
    assert_eq!(snap.hand_number, pushed.hand_number);
    assert_eq!(snap.acting_seat, pushed.acting_seat);
    assert_eq!(snap.community_cards, pushed.community_cards);

    let seat = snap.acting_seat.expect("acting");
    adapter
        .submit_action(seat, Action::Raise(30))
        .await
        .expect("local raise");
}

#[tokio::test]
async fn fallback_without_mirror_rebuilds_seats() {
    let mut settings = heads_up_settings();
    settings.table.max_seats = 3;
    let adapter = SessionAdapter::new(settings).expect("adapter");
    adapter.seat_player(0, alice(), false).await.expect("seat");
    adapter.seat_player(1, bob(), false).await.expect("seat");
    let (remote, _tx) = FakeRemote::new();
    adapter
        .connect_remote(remote.clone(), Some("table-9".into()))
        .await
        .expect("join");
    assert!(matches!(
        remote.requests()[0],
        RemoteRequest::Join { ref table_id } if table_id == "table-9"
    ));

    remote.failing.store(true, Ordering::SeqCst);
    adapter
        .seat_player(2, PlayerProfile::new("u-cara", "Cara"), false)
        .await
        .expect("seated locally");

    let snap = adapter.snapshot().await.expect("snapshot");
    assert_eq!(snap.players.len(), 3);
    assert_eq!(snap.round, BettingRound::Waiting);
    adapter.start_hand().await.expect("local hand");
}

#[tokio::test]
async fn remote_rejection_is_not_a_fallback() {
    let (adapter, remote, _tx) = connected().await;
    let mut sub = adapter.subscribe();
    remote.rejecting.store(true, Ordering::SeqCst);

    let err = adapter.submit_action(1, Action::Check).await.unwrap_err();
    assert!(matches!(err, SessionError::RemoteRejected(ref reason) if reason == "not your turn"));
    assert!(err.is_user_visible());
    assert_eq!(adapter.mode().await, SessionMode::Remote);
    assert_eq!(fallback_notices(&sub.drain()), 0);
}

#[tokio::test]
async fn cannot_go_remote_after_a_hand_started() {
    let adapter = SessionAdapter::new(heads_up_settings()).expect("adapter");
    adapter.seat_player(0, alice(), false).await.expect("seat");
    adapter.seat_player(1, bob(), false).await.expect("seat");
    adapter.start_hand().await.expect("start");

    let (remote, _tx) = FakeRemote::new();
    let err = adapter.connect_remote(remote.clone(), None).await.unwrap_err();
    assert!(matches!(err, SessionError::ModeSwitchRefused));
    assert!(remote.requests().is_empty());
    assert_eq!(adapter.mode().await, SessionMode::Embedded);
}

#[tokio::test]
async fn failed_connect_stays_embedded() {
    let adapter = SessionAdapter::new(heads_up_settings()).expect("adapter");
    let (remote, _tx) = FakeRemote::new();
    remote.failing.store(true, Ordering::SeqCst);

    let err = adapter.connect_remote(remote, None).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(TransportError::Io(_))));
    assert_eq!(adapter.mode().await, SessionMode::Embedded);
}

#[tokio::test]
async fn local_validation_errors_pass_through_after_fallback() {
    let (adapter, remote, tx) = connected().await;
    let mut sub = adapter.subscribe();
    push_state(&tx, &remote_hand_state()).await;
    next_event(&mut sub).await;
    remote.failing.store(true, Ordering::SeqCst);

    let seat = remote_hand_state().acting_seat.expect("acting");
    let err = adapter
        .submit_action(seat, Action::Check)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(GameError::CheckFacingBet { .. })
    ));
    // The switch itself still happened.
    assert_eq!(adapter.mode().await, SessionMode::Embedded);
    assert_eq!(fallback_notices(&sub.drain()), 1);
}

#[tokio::test]
async fn fallback_is_logged_with_reason() {
    let (logs, _guard) = felt_session::capture_logs();

    let (adapter, remote, _tx) = connected().await;
    remote.failing.store(true, Ordering::SeqCst);
    adapter.start_hand().await.expect("started locally");

    let entries = logs.entries();
    let warning = entries
        .iter()
        .find(|e| e.message.contains("remote session lost"))
        .expect("fallback logged");
    assert_eq!(warning.level, tracing::Level::WARN);
    assert!(warning
        .field("reason")
        .is_some_and(|r| r.contains("connection reset")));
}
