//! End-to-end game scenarios on the simulated board

use pong_core::test_utils::Simulator;
use pong_core::{Button, Direction, Duration, GameState, Indicator, PlayerId, SystemMode};
use rstest::{fixture, rstest};

fn ms(n: u32) -> Duration {
    Duration::from_millis(n)
}

#[fixture]
fn sim() -> Simulator {
    Simulator::default()
}

#[rstest]
fn test_first_pass_serves_toward_right_player(mut sim: Simulator) {
    sim.step();

    assert_eq!(sim.state(), GameState::MoveRight);
    assert_eq!(sim.fsm().ball_position(), 12);
    assert_eq!(sim.fsm().direction(), Direction::Right);
    assert!(sim.board().timer.is_running());
    assert_eq!(sim.board().timer.frequency(), 5);
}

#[rstest]
fn test_ball_reaches_right_hitzone_on_schedule(mut sim: Simulator) {
    // Serve at 1 ms, eleven 200 ms steps from cell 12 to cell 1
    assert!(sim.run_until(ms(3000), |s| s.state() == GameState::RightHitzone));
    assert_eq!(sim.now().as_millis(), 2201);
    assert_eq!(sim.fsm().ball_position(), 1);
    assert_eq!(sim.animation_ticks(), 11);
}

#[rstest]
#[case::immediately(0, true)]
#[case::late_in_window(150, true)]
#[case::after_ball_passed(200, false)]
fn test_right_return_window(mut sim: Simulator, #[case] delay_ms: u32, #[case] returned: bool) {
    assert!(sim.run_until(ms(3000), |s| s.state() == GameState::RightHitzone));

    sim.press_after(ms(1 + delay_ms), Button::Right, ms(40));
    sim.run_for(ms(delay_ms + 60));

    if returned {
        assert_eq!(sim.state(), GameState::MoveLeft);
        assert_eq!(sim.fsm().pace(), 6);
        assert_eq!(sim.board().timer.frequency(), 6);
        assert_eq!(sim.fsm().direction(), Direction::Left);
    } else {
        assert_eq!(sim.state(), GameState::P2Lost);
        assert_eq!(sim.fsm().player(PlayerId::First).score(), 1);
        assert_eq!(sim.fsm().player(PlayerId::Second).score(), 0);
    }
}

#[rstest]
fn test_rally_returns_and_left_player_misses(mut sim: Simulator) {
    assert!(sim.run_until(ms(3000), |s| s.state() == GameState::RightHitzone));
    sim.press(Button::Right);

    // From cell 1 at 6 Hz the ball needs 21 steps to reach the left hitzone
    assert!(sim.run_until(ms(4000), |s| s.state() == GameState::LeftHitzone));
    assert_eq!(sim.fsm().ball_position(), 22);

    assert!(sim.run_until(ms(400), |s| s.state() == GameState::P1Lost));
    assert_eq!(sim.fsm().player(PlayerId::Second).score(), 1);
    assert!(sim.board().indicators.is_lit(Indicator::Miss(PlayerId::First)));
    assert_eq!(sim.fsm().saved_position(), 12);
}

#[rstest]
fn test_miss_times_out_and_serves_again(mut sim: Simulator) {
    assert!(sim.run_until(ms(3000), |s| s.state() == GameState::P2Lost));
    let missed_at = sim.now();

    // The lost state takes the timer down on its first pass
    sim.step();
    assert!(!sim.board().timer.is_running());
    assert!(sim.board().indicators.lit_game_cells().is_empty());

    assert!(sim.run_until(ms(2000), |s| s.state() == GameState::InitialServe));
    assert_eq!(sim.now().duration_since(missed_at), ms(1800));
    assert!(!sim.board().indicators.is_lit(Indicator::Miss(PlayerId::Second)));

    sim.step();
    assert_eq!(sim.state(), GameState::MoveRight);
    assert_eq!(sim.fsm().ball_position(), 12);
    assert_eq!(sim.fsm().pace(), 5);
    // Score survives the serve
    assert_eq!(sim.fsm().player(PlayerId::First).score(), 1);
}

#[rstest]
fn test_three_misses_win_the_match(mut sim: Simulator) {
    println!("🏓 Playing a match where the right player never swings");

    assert!(sim.run_until(ms(20_000), |s| s.state() == GameState::P1WinnersCircle));
    let winner = sim.fsm().player(PlayerId::First);
    assert_eq!(winner.score(), 3);
    assert!(winner.is_winner());
    assert_eq!(winner.win_stamp(), sim.now());
    assert_eq!(sim.board().timer.frequency(), 8);
    assert!(sim.board().indicators.lit_game_cells().is_empty());

    // Score lights blink at 8 Hz, ball frozen
    let ticks = sim.animation_ticks();
    let ball = sim.fsm().ball_position();
    sim.run_for(ms(1000));
    assert_eq!(sim.animation_ticks() - ticks, 8);
    assert_eq!(sim.fsm().ball_position(), ball);
    assert!(sim.board().indicators.is_lit(Indicator::Hitzone(PlayerId::First)));

    assert!(sim.run_until(ms(2000), |s| s.state() == GameState::InitialServe));
    let winner = sim.fsm().player(PlayerId::First);
    assert_eq!(winner.score(), 0);
    assert!(!winner.is_winner());
    assert_eq!(sim.board().indicators.score_lights(PlayerId::First), 0);
    assert!(!sim.fsm().player(PlayerId::Second).has_missed());

    println!("  ✅ Winners circle over, new match serving");
}

#[rstest]
fn test_early_swing_loses_the_point(mut sim: Simulator) {
    sim.run_for(ms(300));
    sim.press(Button::Right);
    sim.run_for(ms(30));

    assert_eq!(sim.state(), GameState::P2Lost);
    assert_eq!(sim.fsm().player(PlayerId::First).score(), 1);
}

#[rstest]
fn test_press_blinks_hitzone_for_toggle_interval(mut sim: Simulator) {
    sim.run_for(ms(100));
    assert!(sim.board().indicators.is_lit(Indicator::Hitzone(PlayerId::First)));

    // Edge on the next ms, dispatched 20 ms later
    sim.press(Button::Left);
    sim.run_for(ms(21));
    assert!(sim.fsm().player(PlayerId::First).is_pressed());
    assert!(!sim.board().indicators.is_lit(Indicator::Hitzone(PlayerId::First)));

    sim.run_for(ms(149));
    assert!(!sim.board().indicators.is_lit(Indicator::Hitzone(PlayerId::First)));

    sim.run_for(ms(2));
    assert!(!sim.fsm().player(PlayerId::First).is_pressed());
    assert!(sim.board().indicators.is_lit(Indicator::Hitzone(PlayerId::First)));
    assert_eq!(sim.state(), GameState::MoveRight);
}

#[rstest]
#[case::left(Button::Left)]
#[case::right(Button::Right)]
fn test_released_paddle_is_dropped(mut sim: Simulator, #[case] button: Button) {
    sim.run_for(ms(300));
    sim.tap(button);
    sim.run_for(ms(50));

    assert_eq!(sim.state(), GameState::MoveRight);
    assert!(!sim.fsm().player(PlayerId::First).is_pressed());
    assert!(!sim.fsm().player(PlayerId::Second).is_pressed());
}

#[rstest]
fn test_special_tap_still_toggles(mut sim: Simulator) {
    sim.tap(Button::Special);
    sim.run_for(ms(50));
    assert_eq!(sim.fsm().mode(), SystemMode::MoveMode);
}

#[rstest]
fn test_bouncing_special_button_toggles_once(mut sim: Simulator) {
    for offset in [1, 3, 4, 9, 15] {
        sim.press_after(ms(offset), Button::Special, ms(40));
    }
    sim.run_for(ms(100));

    assert_eq!(sim.fsm().mode(), SystemMode::MoveMode);
}

#[rstest]
fn test_move_mode_placement_wraps_and_serves_from_it(mut sim: Simulator) {
    sim.run_for(ms(500));
    sim.press(Button::Special);
    sim.run_for(ms(50));

    assert_eq!(sim.fsm().mode(), SystemMode::MoveMode);
    assert!(!sim.board().timer.is_running());
    assert_eq!(sim.fsm().ball_position(), 12);
    assert!(sim.board().indicators.is_lit(Indicator::Heartbeat));

    for _ in 0..9 {
        sim.press(Button::Left);
        sim.run_for(ms(50));
    }
    assert_eq!(sim.fsm().ball_position(), 21);
    assert_eq!(sim.board().indicators.lit_game_cells().as_slice(), &[21]);

    sim.press(Button::Left);
    sim.run_for(ms(50));
    assert_eq!(sim.fsm().ball_position(), 2);
    assert!(!sim.board().indicators.is_lit(Indicator::Cell(21)));
    assert_eq!(sim.board().indicators.lit_game_cells().as_slice(), &[2]);
    assert_eq!(sim.fsm().saved_position(), 2);

    sim.press(Button::Special);
    assert!(sim.run_until(ms(100), |s| s.state() == GameState::MoveRight));
    assert_eq!(sim.fsm().mode(), SystemMode::PlayMode);
    assert_eq!(sim.fsm().ball_position(), 2);
    for player in PlayerId::ALL {
        assert_eq!(sim.fsm().player(player).score(), 0);
    }
}

#[rstest]
fn test_mode_switch_mid_match_resets_scores(mut sim: Simulator) {
    assert!(sim.run_until(ms(3000), |s| s.state() == GameState::P2Lost));
    assert_eq!(sim.board().indicators.score_lights(PlayerId::First), 1);

    sim.press(Button::Special);
    sim.run_for(ms(50));

    assert_eq!(sim.fsm().player(PlayerId::First).score(), 0);
    assert!(!sim.fsm().player(PlayerId::Second).has_missed());
    assert_eq!(sim.board().indicators.score_lights(PlayerId::First), 0);
    assert!(!sim.board().indicators.is_lit(Indicator::Miss(PlayerId::Second)));
    for player in PlayerId::ALL {
        assert!(sim.board().indicators.is_lit(Indicator::Hitzone(player)));
    }
}
