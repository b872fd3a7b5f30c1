//! embedded-hal adapters against scripted pins

use embedded_hal_mock::eh1::pin::{Mock as PinMock, State, Transaction};
use embedded_hal_mock::eh1::MockError;
use pong_core::hal::mock::{MockAnimationTimer, MockClock, MockIndicators};
use pong_core::{
    Button, ButtonLines, EmbeddedHalButtons, EmbeddedHalIndicators, GameConfig, GameFsm, Indicator,
    IndicatorDriver, Instant, PongHal, SystemMode,
};

#[test]
fn test_active_high_indicator_bank() {
    let cell0 = PinMock::new(&[Transaction::set(State::High), Transaction::set(State::Low)]);
    let cell1 = PinMock::new(&[Transaction::set(State::High), Transaction::set(State::Low)]);
    let cell2 = PinMock::new(&[]);
    let mut checks = [cell0.clone(), cell1.clone(), cell2.clone()];

    let mut bank = EmbeddedHalIndicators::new([cell0, cell1, cell2], false);
    assert_eq!(bank.fitted(), 3);

    bank.set(Indicator::Cell(0), true);
    bank.set(Indicator::Cell(0), false);
    bank.toggle(Indicator::Cell(1));
    assert!(bank.is_lit(Indicator::Cell(1)));
    bank.toggle(Indicator::Cell(1));
    assert!(!bank.is_lit(Indicator::Cell(1)));

    for pin in checks.iter_mut() {
        pin.done();
    }
}

#[test]
fn test_active_low_indicator_bank() {
    let cell0 = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);
    let mut check = cell0.clone();

    let mut bank = EmbeddedHalIndicators::new([cell0], true);
    bank.set(Indicator::Cell(0), true);
    assert!(bank.is_lit(Indicator::Cell(0)));
    bank.set(Indicator::Cell(0), false);

    check.done();
}

#[test]
fn test_unfitted_indicators_only_touch_shadow() {
    let cell0 = PinMock::new(&[]);
    let mut check = cell0.clone();

    let mut bank = EmbeddedHalIndicators::new([cell0], false);
    bank.set(Indicator::Heartbeat, true);
    bank.set(Indicator::Cell(40), true);

    assert!(bank.is_lit(Indicator::Heartbeat));
    assert!(!bank.is_lit(Indicator::Cell(40)));
    check.done();
}

#[test]
fn test_button_lines_are_active_low() {
    let left = PinMock::new(&[Transaction::get(State::Low)]);
    let right = PinMock::new(&[Transaction::get(State::High)]);
    let special = PinMock::new(&[
        Transaction::get(State::Low).with_error(MockError::Io(std::io::ErrorKind::Other)),
    ]);
    let mut checks = [left.clone(), right.clone(), special.clone()];

    let mut buttons = EmbeddedHalButtons::new(left, right, special);
    assert!(buttons.is_asserted(Button::Left));
    assert!(!buttons.is_asserted(Button::Right));
    // Read failure counts as released
    assert!(!buttons.is_asserted(Button::Special));

    for pin in checks.iter_mut() {
        pin.done();
    }
}

/// Mock board whose buttons are read through the embedded-hal adapter
struct PinBoard {
    indicators: MockIndicators,
    timer: MockAnimationTimer,
    clock: MockClock,
    buttons: EmbeddedHalButtons<PinMock, PinMock, PinMock>,
}

impl PongHal for PinBoard {
    type Indicators = MockIndicators;
    type Timer = MockAnimationTimer;
    type Clock = MockClock;
    type Buttons = EmbeddedHalButtons<PinMock, PinMock, PinMock>;

    fn indicators(&mut self) -> &mut MockIndicators {
        &mut self.indicators
    }

    fn animation_timer(&mut self) -> &mut MockAnimationTimer {
        &mut self.timer
    }

    fn clock(&self) -> &MockClock {
        &self.clock
    }

    fn buttons(&mut self) -> &mut Self::Buttons {
        &mut self.buttons
    }
}

#[test]
fn test_dispatch_reads_paddle_line_once() {
    // Special never reads its line; each paddle press reads its own once
    let left = PinMock::new(&[Transaction::get(State::Low)]);
    let right = PinMock::new(&[Transaction::get(State::High)]);
    let special = PinMock::new(&[]);
    let mut checks = [left.clone(), right.clone(), special.clone()];

    let mut board = PinBoard {
        indicators: MockIndicators::new(),
        timer: MockAnimationTimer::new(),
        clock: MockClock::new(),
        buttons: EmbeddedHalButtons::new(left, right, special),
    };
    let mut fsm = GameFsm::new(GameConfig::default());
    let now = Instant::from_millis(100);

    fsm.dispatch(Button::Special, &mut board, now);
    assert_eq!(fsm.mode(), SystemMode::MoveMode);

    fsm.dispatch(Button::Left, &mut board, now);
    assert_eq!(fsm.ball_position(), 13);

    // Right line reads high: released before the debounce ended
    fsm.dispatch(Button::Right, &mut board, now);
    assert_eq!(fsm.ball_position(), 13);

    for pin in checks.iter_mut() {
        pin.done();
    }
}
