use felt_ai::{create_ai, decide_with_fallback, BotStrategy, DecisionConfig, DecisionError, DecisionRng, RangeBot};
use felt_engine::cards::parse_cards;
use felt_engine::player::{Action, PlayerProfile};
use felt_engine::snapshot::TableSnapshot;
use felt_engine::table::{BettingRound, Table, TableConfig};
use rand::SeedableRng;

fn six_max(seed: u64) -> Table {
    let mut t = Table::new(TableConfig {
        max_seats: 6,
        small_blind: 5,
        big_blind: 10,
        seed: Some(seed),
    })
    .expect("table");
    for seat in 0..6 {
        t.seat_player(seat, PlayerProfile::new(format!("bot{seat}"), "bot"), 1000, true)
            .expect("seat");
    }
    t
}

fn with_hole(mut snap: TableSnapshot, seat: usize, cards: &str) -> TableSnapshot {
    let cards = parse_cards(cards).expect("cards");
    for p in snap.players.iter_mut().filter(|p| p.seat == seat) {
        p.hole_cards = Some(cards.clone());
    }
    snap
}

fn bot() -> RangeBot {
    RangeBot::new(DecisionConfig::default()).expect("bot")
}

#[test]
fn button_four_bets_aces_against_open_and_three_bet() {
    // Dealer 0: seat 3 is EP, seat 4 MP, seat 5 CO.
    let mut t = six_max(1);
    t.start_hand().expect("start");
    assert_eq!(t.acting_seat(), Some(3));
    t.apply_action(3, Action::Raise(30)).expect("EP open");
    t.apply_action(4, Action::Raise(90)).expect("MP 3-bet");
    t.apply_action(5, Action::Fold).expect("CO fold");
    assert_eq!(t.acting_seat(), Some(0));

    let snap = with_hole(t.snapshot(), 0, "As Ah");
    let mut rng = DecisionRng::seed_from_u64(3);
    let action = bot().decide(&snap, 0, &mut rng).expect("decision");
    assert!(matches!(action, Action::Raise(to) if to > 90), "got {action}");
    t.apply_action(0, action).expect("4-bet is legal");
}

#[test]
fn opener_folds_weak_hand_to_three_bet() {
    let mut t = six_max(2);
    t.start_hand().expect("start");
    t.apply_action(3, Action::Raise(30)).expect("open");
    t.apply_action(4, Action::Raise(90)).expect("3-bet");
    for seat in [5, 0, 1, 2] {
        t.apply_action(seat, Action::Fold).expect("fold");
    }
    assert_eq!(t.acting_seat(), Some(3));

    let mut rng = DecisionRng::seed_from_u64(3);
    let weak = with_hole(t.snapshot(), 3, "9c 8c");
    assert_eq!(bot().decide(&weak, 3, &mut rng), Ok(Action::Fold));
    let queens = with_hole(t.snapshot(), 3, "Qc Qd");
    assert!(matches!(bot().decide(&queens, 3, &mut rng), Ok(Action::Raise(_))));
    let jacks = with_hole(t.snapshot(), 3, "Jc Jd");
    assert_eq!(bot().decide(&jacks, 3, &mut rng), Ok(Action::Call));
}

#[test]
fn missing_range_entry_folds() {
    // EP limps and then faces a cutoff raise: no chart covers it.
    let mut t = six_max(4);
    t.start_hand().expect("start");
    t.apply_action(3, Action::Call).expect("limp");
    t.apply_action(4, Action::Fold).expect("fold");
    t.apply_action(5, Action::Raise(40)).expect("raise");
    for seat in [0, 1, 2] {
        t.apply_action(seat, Action::Fold).expect("fold");
    }
    assert_eq!(t.acting_seat(), Some(3));
    let snap = with_hole(t.snapshot(), 3, "Kc Kd");
    let mut rng = DecisionRng::seed_from_u64(9);
    assert_eq!(bot().decide(&snap, 3, &mut rng), Ok(Action::Fold));
}

#[test]
fn big_blind_checks_option_with_weak_hand() {
    let mut t = six_max(5);
    t.start_hand().expect("start");
    for seat in [3, 4, 5, 0, 1] {
        t.apply_action(seat, Action::Call).expect("limp");
    }
    assert_eq!(t.acting_seat(), Some(2));
    let snap = with_hole(t.snapshot(), 2, "7c 2d");
    let mut rng = DecisionRng::seed_from_u64(1);
    assert_eq!(bot().decide(&snap, 2, &mut rng), Ok(Action::Check));
}

#[test]
fn same_snapshot_and_seed_give_same_action() {
    let mut t = six_max(8);
    t.start_hand().expect("start");
    while t.round() == BettingRound::Preflop {
        let seat = t.acting_seat().expect("acting");
        t.apply_action(seat, Action::Call).expect("call");
    }
    let seat = t.acting_seat().expect("flop actor");
    let snap = t.snapshot();
    let bot = bot();
    let first = bot
        .decide(&snap, seat, &mut DecisionRng::seed_from_u64(42))
        .expect("decide");
    for _ in 0..20 {
        let again = bot
            .decide(&snap, seat, &mut DecisionRng::seed_from_u64(42))
            .expect("decide");
        assert_eq!(again, first);
    }
}

struct Panicker;

impl BotStrategy for Panicker {
    fn decide(&self, _: &TableSnapshot, _: usize, _: &mut DecisionRng) -> Result<Action, DecisionError> {
        panic!("scoring blew up")
    }

    fn name(&self) -> &str {
        "Panicker"
    }
}

struct Broken;

impl BotStrategy for Broken {
    fn decide(&self, _: &TableSnapshot, seat: usize, _: &mut DecisionRng) -> Result<Action, DecisionError> {
        Err(DecisionError::NoHoleCards(seat))
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

struct AlwaysBets;

impl BotStrategy for AlwaysBets {
    fn decide(&self, _: &TableSnapshot, _: usize, _: &mut DecisionRng) -> Result<Action, DecisionError> {
        Ok(Action::Bet(1))
    }

    fn name(&self) -> &str {
        "AlwaysBets"
    }
}

#[test]
fn fallback_folds_when_facing_a_bet_and_checks_when_free() {
    let mut t = six_max(6);
    t.start_hand().expect("start");
    let facing = t.snapshot();
    let mut rng = DecisionRng::seed_from_u64(0);
    assert_eq!(decide_with_fallback(&Panicker, &facing, 3, &mut rng), Action::Fold);
    assert_eq!(decide_with_fallback(&Broken, &facing, 3, &mut rng), Action::Fold);
    assert_eq!(decide_with_fallback(&AlwaysBets, &facing, 3, &mut rng), Action::Fold);

    for seat in [3, 4, 5, 0, 1] {
        t.apply_action(seat, Action::Call).expect("limp");
    }
    let option = t.snapshot();
    assert_eq!(decide_with_fallback(&Panicker, &option, 2, &mut rng), Action::Check);
    assert_eq!(decide_with_fallback(&AlwaysBets, &option, 2, &mut rng), Action::Check);
}

#[test]
fn bots_play_whole_sessions_without_stalling() {
    let bot = create_ai("range", DecisionConfig::default()).expect("bot");
    for seed in 0..10u64 {
        let mut t = six_max(seed);
        let mut rng = DecisionRng::seed_from_u64(seed);
        for _ in 0..15 {
            if t.start_hand().is_err() {
                break;
            }
            let mut steps = 0;
            while let Some(seat) = t.acting_seat() {
                steps += 1;
                assert!(steps < 200);
                let action = decide_with_fallback(bot.as_ref(), &t.snapshot(), seat, &mut rng);
                t.apply_action(seat, action).expect("fallback output is always legal");
            }
            assert_eq!(t.round(), BettingRound::HandOver);
        }
    }
}

#[test]
fn heuristics_switch_off_uses_made_hands_only() {
    let config = DecisionConfig {
        postflop_heuristics: false,
        bluffing: false,
        ..DecisionConfig::default()
    };
    let bot = RangeBot::new(config).expect("bot");
    let mut t = six_max(12);
    t.start_hand().expect("start");
    while t.round() == BettingRound::Preflop {
        let seat = t.acting_seat().expect("acting");
        t.apply_action(seat, Action::Call).expect("call");
    }
    let seat = t.acting_seat().expect("flop actor");
    let mut snap = t.snapshot();
    snap.community_cards = parse_cards("2c 7d 9h").expect("board");
    let snap = with_hole(snap, seat, "Kc Qd");
    let mut rng = DecisionRng::seed_from_u64(0);
    assert_eq!(bot.decide(&snap, seat, &mut rng), Ok(Action::Check));
}
