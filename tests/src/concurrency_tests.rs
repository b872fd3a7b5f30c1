//! Interrupt sources as concurrent tokio tasks
//!
//! The millisecond tick, the animation timer and the console each run as
//! their own task on paused virtual time and meet only through the pending
//! trigger set, the button latch and the console lock, the way the board's
//! interrupt handlers do.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pong_core::hal::mock::MockBoard;
use pong_core::{
    Button, ButtonLatch, Console, GameConfig, GameState, PendingTriggers, PlayerId, SystemMode, Trigger,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};

type SharedConsole = Arc<Mutex<Console<'static, MockBoard>>>;

struct Rig {
    console: SharedConsole,
    pending: &'static PendingTriggers,
    wake: Arc<Notify>,
    tasks: Vec<JoinHandle<()>>,
}

impl Rig {
    fn start() -> Self {
        let latch: &'static ButtonLatch = Box::leak(Box::new(ButtonLatch::new()));
        let pending: &'static PendingTriggers = Box::leak(Box::new(PendingTriggers::new()));
        let console = Arc::new(Mutex::new(Console::new(
            GameConfig::default(),
            MockBoard::new(),
            latch,
            pending,
        )));
        let wake = Arc::new(Notify::new());

        let tasks = vec![
            tokio::spawn(millis_task(console.clone(), pending, wake.clone())),
            tokio::spawn(animation_task(console.clone(), pending, wake.clone())),
            tokio::spawn(console_task(console.clone(), wake.clone())),
        ];

        Self { console, pending, wake, tasks }
    }

    /// Button edge interrupt with the line held for `hold`
    async fn press(&self, button: Button, hold: Duration) {
        self.console.lock().unwrap().hal_mut().buttons.set_held(button, true);
        self.pending.raise(Trigger::edge(button));
        self.wake.notify_one();

        sleep(hold).await;
        self.console.lock().unwrap().hal_mut().buttons.set_held(button, false);
    }

    fn read<R>(&self, f: impl FnOnce(&Console<'static, MockBoard>) -> R) -> R {
        f(&self.console.lock().unwrap())
    }

    fn stop(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

async fn millis_task(console: SharedConsole, pending: &'static PendingTriggers, wake: Arc<Notify>) {
    let mut ticker = interval(Duration::from_millis(1));
    ticker.tick().await;
    loop {
        ticker.tick().await;
        console
            .lock()
            .unwrap()
            .hal_mut()
            .clock
            .advance(pong_core::Duration::from_millis(1));
        pending.raise(Trigger::MillisTick);
        wake.notify_one();
    }
}

async fn animation_task(console: SharedConsole, pending: &'static PendingTriggers, wake: Arc<Notify>) {
    loop {
        let armed = {
            let console = console.lock().unwrap();
            let timer = &console.hal().timer;
            timer.is_running().then(|| (timer.start_count(), timer.frequency()))
        };

        let Some((starts, frequency)) = armed else {
            sleep(Duration::from_millis(1)).await;
            continue;
        };

        let period = GameConfig::tick_period(frequency).as_millis();
        sleep(Duration::from_millis(u64::from(period))).await;

        // A stop, restart or retune during the wait cancels this tick
        let still_armed = {
            let console = console.lock().unwrap();
            let timer = &console.hal().timer;
            timer.is_running() && timer.start_count() == starts && timer.frequency() == frequency
        };
        if still_armed {
            pending.raise(Trigger::AnimationTick);
            wake.notify_one();
        }
    }
}

async fn console_task(console: SharedConsole, wake: Arc<Notify>) {
    loop {
        wake.notified().await;
        console.lock().unwrap().service_all();
    }
}

#[tokio::test(start_paused = true)]
async fn test_unreturned_serve_is_lost() {
    let rig = Rig::start();

    sleep(Duration::from_millis(3000)).await;

    let (state, score) = rig.read(|c| {
        (c.fsm().current_state(), c.fsm().player(PlayerId::First).score())
    });
    assert_eq!(state, GameState::P2Lost);
    assert_eq!(score, 1);
    rig.stop();
}

#[tokio::test(start_paused = true)]
async fn test_press_in_hitzone_returns_ball() {
    let rig = Rig::start();

    // Ball sits on cell 1 from about 2.2 s to 2.4 s
    sleep(Duration::from_millis(2300)).await;
    assert_eq!(rig.read(|c| c.fsm().current_state()), GameState::RightHitzone);
    rig.press(Button::Right, Duration::from_millis(40)).await;

    sleep(Duration::from_millis(160)).await;
    let (state, pace, frequency) = rig.read(|c| {
        (c.fsm().current_state(), c.fsm().pace(), c.hal().timer.frequency())
    });
    assert_eq!(state, GameState::MoveLeft);
    assert_eq!(pace, 6);
    assert_eq!(frequency, 6);
    rig.stop();
}

#[tokio::test(start_paused = true)]
async fn test_bounce_storm_toggles_mode_once() {
    let rig = Rig::start();
    sleep(Duration::from_millis(100)).await;

    rig.console.lock().unwrap().hal_mut().buttons.set_held(Button::Special, true);
    for _ in 0..10 {
        rig.pending.raise(Trigger::SpecialEdge);
        rig.wake.notify_one();
        sleep(Duration::from_millis(1)).await;
    }
    sleep(Duration::from_millis(60)).await;

    let (mode, debouncing, running) = rig.read(|c| {
        (c.fsm().mode(), c.latch().is_debouncing(), c.hal().timer.is_running())
    });
    assert_eq!(mode, SystemMode::MoveMode);
    assert!(!debouncing);
    assert!(!running);
    rig.stop();
}
