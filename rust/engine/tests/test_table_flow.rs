use felt_engine::player::{Action, PlayerProfile};
use felt_engine::pot::Pot;
use felt_engine::table::{BettingRound, Table, TableConfig};
use felt_engine::GameError;

fn table(max_seats: usize, stacks: &[u32]) -> Table {
    let mut t = Table::new(TableConfig {
        max_seats,
        small_blind: 5,
        big_blind: 10,
        seed: Some(2024),
    })
    .expect("table");
    for (seat, &stack) in stacks.iter().enumerate() {
        let id = format!("p{seat}");
        t.seat_player(seat, PlayerProfile::new(id.clone(), id), stack, false)
            .expect("seat");
    }
    t
}

#[test]
fn heads_up_limp_and_check_reaches_flop() {
    let mut t = table(2, &[1000, 1000]);
    t.start_hand().expect("start");
    assert_eq!(t.dealer_seat(), Some(0));
    assert_eq!(t.acting_seat(), Some(0));

    let outcome = t.apply_action(0, Action::Call).expect("sb call");
    assert!(!outcome.round_advanced);
    assert_eq!(t.acting_seat(), Some(1));

    let outcome = t.apply_action(1, Action::Check).expect("bb check");
    assert!(outcome.round_advanced);
    assert_eq!(t.round(), BettingRound::Flop);
    assert_eq!(t.pot_total(), 20);
    assert_eq!(t.board().len(), 3);
    assert_eq!(t.current_highest_bet(), 0);
    // Big blind acts first after the flop heads-up.
    assert_eq!(t.acting_seat(), Some(1));
}

#[test]
fn short_call_goes_all_in_for_exact_stack() {
    // Dealer 0, blinds on 1 and 2, seat 3 opens.
    let mut t = table(4, &[50, 1000, 1000, 1000]);
    t.start_hand().expect("start");
    assert_eq!(t.acting_seat(), Some(3));
    t.apply_action(3, Action::Raise(100)).expect("open");

    let before = t.player(0).expect("seat 0").current_bet;
    t.apply_action(0, Action::Call).expect("call");
    let p = t.player(0).expect("seat 0");
    assert!(p.is_all_in);
    assert_eq!(p.stack, 0);
    assert_eq!(p.current_bet - before, 50);
    assert_eq!(t.current_highest_bet(), 100);
    assert_eq!(t.acting_seat(), Some(1));
}

#[test]
fn wrong_seat_and_illegal_amounts_are_rejected() {
    let mut t = table(3, &[1000, 1000, 1000]);
    t.start_hand().expect("start");
    let acting = t.acting_seat().expect("acting");
    let other = (acting + 1) % 3;
    assert_eq!(
        t.apply_action(other, Action::Fold),
        Err(GameError::NotPlayersTurn {
            expected: Some(acting),
            actual: other
        })
    );
    assert_eq!(
        t.apply_action(acting, Action::Raise(15)),
        Err(GameError::InvalidBetAmount {
            amount: 15,
            minimum: 20
        })
    );
    assert_eq!(
        t.apply_action(acting, Action::Bet(40)),
        Err(GameError::BetAlreadyOpen { current: 10 })
    );
    assert!(t.apply_action(acting, Action::Raise(20)).is_ok());
}

#[test]
fn all_in_players_split_into_side_pots() {
    let mut t = table(3, &[100, 300, 1000]);
    t.start_hand().expect("start");
    // Dealer 0 acts first three-handed.
    t.apply_action(0, Action::Raise(100)).expect("shove 100");
    t.apply_action(1, Action::Raise(300)).expect("shove 300");
    let outcome = t.apply_action(2, Action::Call).expect("call");

    let result = outcome.hand_result.expect("run out to showdown");
    assert_eq!(t.round(), BettingRound::HandOver);
    assert_eq!(t.board().len(), 5);
    assert_eq!(result.showdown.len(), 3);

    let main: u32 = result.awards.iter().filter(|a| a.pot_index == 0).map(|a| a.amount).sum();
    let side: u32 = result.awards.iter().filter(|a| a.pot_index == 1).map(|a| a.amount).sum();
    assert_eq!(main, 300);
    assert_eq!(side, 400);
    assert!(result
        .awards
        .iter()
        .filter(|a| a.pot_index == 1)
        .all(|a| a.seat != 0));

    let total: u32 = (0..3).map(|s| t.player(s).expect("seat").stack).sum();
    assert_eq!(total, 1400);
    assert!(t.pots().is_empty());
}

#[test]
fn busted_player_sits_out_and_leavers_are_removed() {
    let mut t = table(3, &[1000, 1000, 1000]);
    t.start_hand().expect("start");
    let acting = t.acting_seat().expect("acting");
    assert_eq!(t.leave(acting), Ok(false));
    t.apply_action(acting, Action::Fold).expect("fold");
    let next = t.acting_seat().expect("next");
    t.apply_action(next, Action::Fold).expect("fold");
    assert_eq!(t.round(), BettingRound::HandOver);

    t.start_hand().expect("second hand");
    assert!(t.player(acting).is_none());
    assert_eq!(t.seated_count(), 2);
}

#[test]
fn blinds_change_only_between_hands() {
    let mut t = table(2, &[1000, 1000]);
    t.start_hand().expect("start");
    assert_eq!(t.set_blinds(10, 20), Err(GameError::HandInProgress));
    t.apply_action(0, Action::Fold).expect("fold");
    t.set_blinds(10, 20).expect("between hands");
    t.start_hand().expect("start");
    assert_eq!(t.current_highest_bet(), 20);
}

#[test]
fn start_needs_two_funded_players() {
    let mut t = table(2, &[1000]);
    assert_eq!(t.start_hand(), Err(GameError::NotEnoughPlayers(1)));
}

#[test]
fn uncalled_raise_returns_through_own_pot() {
    let mut t = table(2, &[1000, 1000]);
    t.start_hand().expect("start");
    t.apply_action(0, Action::Call).expect("call");
    t.apply_action(1, Action::Check).expect("check");
    t.apply_action(1, Action::Bet(50)).expect("bet");
    assert_eq!(t.pots(), &[Pot { amount: 20, eligible: vec![0, 1] }]);
    let outcome = t.apply_action(0, Action::Fold).expect("fold");
    let result = outcome.hand_result.expect("over");
    assert!(result.uncontested());
    assert_eq!(result.total_won_by(1), 70);
    assert_eq!(t.player(1).expect("winner").stack, 1010);
}
