#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;

// RISC-V runtime
use riscv_rt as _;

// Panic handler
use panic_halt as _;

use embassy_executor::Spawner;

use pong_firmware::board::{self, pins, Ch32v203Board};
use pong_firmware::*;

// Cells shared with interrupt context
static LATCH: ButtonLatch = ButtonLatch::new();
static PENDING: PendingTriggers = PendingTriggers::new();
static TIMER_COMMANDS: TimerSignal = TimerSignal::new();
static CONSOLE: SharedConsole<Ch32v203Board> = SharedConsole::new();

/// Main firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("pong firmware {} starting", VERSION);

    board::init_peripherals();
    let board = Ch32v203Board::new(&TIMER_COMMANDS);
    CONSOLE.install(Console::new(default_config(), board, &LATCH, &PENDING));

    spawner.must_spawn(animation_task());
    spawner.must_spawn(console_task());
}

#[embassy_executor::task]
async fn animation_task() {
    animation_timer_loop(&TIMER_COMMANDS, &PENDING).await
}

#[embassy_executor::task]
async fn console_task() {
    console_loop(&CONSOLE).await
}

// ========================================
// Interrupt Handlers
// ========================================

/// 1 ms tick: embassy time base and the millisecond trigger
#[no_mangle]
extern "C" fn SysTick_Handler() {
    board::ack_systick();
    pong_firmware::time_driver::on_systick();
    on_millis_interrupt(&PENDING);
}

/// Left paddle edge
#[no_mangle]
extern "C" fn EXTI0_IRQHandler() {
    if board::take_exti(pins::LEFT_BUTTON) {
        PENDING.raise(Trigger::LeftEdge);
    }
}

/// Right paddle edge
#[no_mangle]
extern "C" fn EXTI1_IRQHandler() {
    if board::take_exti(pins::RIGHT_BUTTON) {
        PENDING.raise(Trigger::RightEdge);
    }
}

/// Mode button edge
#[no_mangle]
extern "C" fn EXTI15_10_IRQHandler() {
    if board::take_exti(pins::SPECIAL_BUTTON) {
        PENDING.raise(Trigger::SpecialEdge);
    }
}
