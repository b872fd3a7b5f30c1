//! CH32V203 board implementation
//!
//! Register-level GPIO, EXTI and SysTick set-up for a CH32V203RB with the
//! 24-cell strip on ports B and C, the score lights on C and A, and the
//! three buttons on PA0, PA1 and PC13 (pulled up, pressed = low).

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use pong_core::hal::{EmbeddedHalButtons, EmbeddedHalIndicators, PongHal};

use crate::drivers::{EmbassyClock, SignalAnimationTimer, TimerSignal};

const RCC_BASE: u32 = 0x4002_1000;
const AFIO_BASE: u32 = 0x4001_0000;
const EXTI_BASE: u32 = 0x4001_0400;
const GPIOA_BASE: u32 = 0x4001_0800;
const GPIOB_BASE: u32 = 0x4001_0C00;
const GPIOC_BASE: u32 = 0x4001_1000;
const PFIC_BASE: u32 = 0xE000_E000;
const STK_BASE: u32 = 0xE000_F000;

const RCC_APB2PCENR: u32 = 0x18;

const GPIO_CFGLR: u32 = 0x00;
const GPIO_CFGHR: u32 = 0x04;
const GPIO_INDR: u32 = 0x08;
const GPIO_OUTDR: u32 = 0x0C;
const GPIO_BSHR: u32 = 0x10;

const AFIO_EXTICR1: u32 = 0x08;
const AFIO_EXTICR4: u32 = 0x14;

const EXTI_INTENR: u32 = 0x00;
const EXTI_FTENR: u32 = 0x0C;
const EXTI_INTFR: u32 = 0x14;

const PFIC_IENR1: u32 = 0x100;
const PFIC_IENR2: u32 = 0x104;

const STK_CTLR: u32 = 0x00;
const STK_SR: u32 = 0x04;
const STK_CMPLR: u32 = 0x10;

/// Core clock straight out of reset (HSI, no PLL)
pub const HCLK_HZ: u32 = 8_000_000;

const IRQ_SYSTICK: u32 = 12;
const IRQ_EXTI0: u32 = 22;
const IRQ_EXTI1: u32 = 23;
const IRQ_EXTI15_10: u32 = 56;

/// Pin map
pub mod pins {
    use super::{GPIOA_BASE, GPIOB_BASE, GPIOC_BASE};

    /// Port base address and pin number
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PinId {
        pub port: u32,
        pub pin: u8,
    }

    const fn pa(pin: u8) -> PinId {
        PinId { port: GPIOA_BASE, pin }
    }

    const fn pb(pin: u8) -> PinId {
        PinId { port: GPIOB_BASE, pin }
    }

    const fn pc(pin: u8) -> PinId {
        PinId { port: GPIOC_BASE, pin }
    }

    /// Indicator pins, in `Indicator::index` order: cells 0..=23, first
    /// player's score lights, second player's score lights, heartbeat.
    pub const INDICATORS: [PinId; pong_core::Indicator::COUNT] = [
        pb(0), pb(1), pb(2), pb(3), pb(4), pb(5), pb(6), pb(7),
        pb(8), pb(9), pb(10), pb(11), pb(12), pb(13), pb(14), pb(15),
        pc(0), pc(1), pc(2), pc(3), pc(4), pc(5), pc(6), pc(7),
        pc(8), pc(9), pc(10),
        pc(11), pc(12), pa(8),
        pa(5),
    ];

    /// Left paddle (EXTI0)
    pub const LEFT_BUTTON: PinId = pa(0);
    /// Right paddle (EXTI1)
    pub const RIGHT_BUTTON: PinId = pa(1);
    /// Mode button (EXTI13)
    pub const SPECIAL_BUTTON: PinId = pc(13);
}

use pins::PinId;

fn reg(base: u32, offset: u32) -> *mut u32 {
    (base + offset) as *mut u32
}

fn modify(base: u32, offset: u32, f: impl FnOnce(u32) -> u32) {
    let r = reg(base, offset);
    unsafe {
        let value = core::ptr::read_volatile(r);
        core::ptr::write_volatile(r, f(value));
    }
}

/// One GPIO line, driven through BSHR and read through INDR
#[derive(Debug, Clone, Copy)]
pub struct GpioPin {
    id: PinId,
}

impl GpioPin {
    pub const fn new(id: PinId) -> Self {
        Self { id }
    }

    /// Write the 4-bit CNF/MODE field for this pin
    fn configure(&self, bits: u32) {
        let (offset, shift) = if self.id.pin < 8 {
            (GPIO_CFGLR, u32::from(self.id.pin) * 4)
        } else {
            (GPIO_CFGHR, u32::from(self.id.pin - 8) * 4)
        };
        modify(self.id.port, offset, |value| (value & !(0xF << shift)) | (bits << shift));
    }

    /// Push-pull output, 2 MHz
    pub fn into_output(self) -> Self {
        self.configure(0x2);
        self
    }

    /// Input with pull-up
    pub fn into_pull_up_input(self) -> Self {
        self.configure(0x8);
        modify(self.id.port, GPIO_OUTDR, |value| value | (1 << self.id.pin));
        self
    }

    fn level(&self) -> bool {
        let indr = unsafe { core::ptr::read_volatile(reg(self.id.port, GPIO_INDR)) };
        indr & (1 << self.id.pin) != 0
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        unsafe { core::ptr::write_volatile(reg(self.id.port, GPIO_BSHR), 1 << (self.id.pin + 16)) };
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        unsafe { core::ptr::write_volatile(reg(self.id.port, GPIO_BSHR), 1 << self.id.pin) };
        Ok(())
    }
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

/// Complete CH32V203 board
pub struct Ch32v203Board {
    indicators: EmbeddedHalIndicators<GpioPin>,
    timer: SignalAnimationTimer,
    clock: EmbassyClock,
    buttons: EmbeddedHalButtons<GpioPin, GpioPin, GpioPin>,
}

impl Ch32v203Board {
    /// Configure the pins and build the board. Call [`init_peripherals`]
    /// first so the ports are clocked.
    pub fn new(timer_commands: &'static TimerSignal) -> Self {
        let indicators = EmbeddedHalIndicators::new(
            pins::INDICATORS.iter().map(|id| GpioPin::new(*id).into_output()),
            false,
        );
        let buttons = EmbeddedHalButtons::new(
            GpioPin::new(pins::LEFT_BUTTON).into_pull_up_input(),
            GpioPin::new(pins::RIGHT_BUTTON).into_pull_up_input(),
            GpioPin::new(pins::SPECIAL_BUTTON).into_pull_up_input(),
        );

        log_info!("board up, {} indicators", indicators.fitted());
        Self {
            indicators,
            timer: SignalAnimationTimer::new(timer_commands),
            clock: EmbassyClock,
            buttons,
        }
    }
}

impl PongHal for Ch32v203Board {
    type Indicators = EmbeddedHalIndicators<GpioPin>;
    type Timer = SignalAnimationTimer;
    type Clock = EmbassyClock;
    type Buttons = EmbeddedHalButtons<GpioPin, GpioPin, GpioPin>;

    fn indicators(&mut self) -> &mut Self::Indicators {
        &mut self.indicators
    }

    fn animation_timer(&mut self) -> &mut Self::Timer {
        &mut self.timer
    }

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn buttons(&mut self) -> &mut Self::Buttons {
        &mut self.buttons
    }
}

/// Clock the ports, route the button lines to EXTI (falling edge) and
/// start the 1 ms SysTick.
pub fn init_peripherals() {
    // AFIO, IOPA, IOPB, IOPC
    modify(RCC_BASE, RCC_APB2PCENR, |value| value | (1 << 0) | (1 << 2) | (1 << 3) | (1 << 4));

    // EXTI0/EXTI1 from port A (0), EXTI13 from port C (2)
    modify(AFIO_BASE, AFIO_EXTICR1, |value| value & !0xFF);
    modify(AFIO_BASE, AFIO_EXTICR4, |value| (value & !(0xF << 4)) | (0x2 << 4));

    let lines = exti_line(pins::LEFT_BUTTON) | exti_line(pins::RIGHT_BUTTON) | exti_line(pins::SPECIAL_BUTTON);
    modify(EXTI_BASE, EXTI_FTENR, |value| value | lines);
    modify(EXTI_BASE, EXTI_INTENR, |value| value | lines);

    unsafe {
        core::ptr::write_volatile(reg(STK_BASE, STK_CMPLR), HCLK_HZ / 1000 - 1);
        core::ptr::write_volatile(reg(STK_BASE, STK_SR), 0);
        // STE | STIE | STCLK = HCLK | STRE
        core::ptr::write_volatile(reg(STK_BASE, STK_CTLR), 0xF);
    }

    enable_irq(IRQ_SYSTICK);
    enable_irq(IRQ_EXTI0);
    enable_irq(IRQ_EXTI1);
    enable_irq(IRQ_EXTI15_10);
}

fn exti_line(id: PinId) -> u32 {
    1 << id.pin
}

fn enable_irq(irq: u32) {
    let (offset, bit) = if irq < 32 { (PFIC_IENR1, irq) } else { (PFIC_IENR2, irq - 32) };
    // IENR is write-one-to-set
    unsafe { core::ptr::write_volatile(reg(PFIC_BASE, offset), 1 << bit) };
}

/// Acknowledge the SysTick compare flag
pub fn ack_systick() {
    unsafe { core::ptr::write_volatile(reg(STK_BASE, STK_SR), 0) };
}

/// Clear the EXTI flag for a button pin. Returns true if it was set.
pub fn take_exti(id: PinId) -> bool {
    let line = exti_line(id);
    let pending = unsafe { core::ptr::read_volatile(reg(EXTI_BASE, EXTI_INTFR)) };
    if pending & line == 0 {
        return false;
    }
    // Write one to clear
    unsafe { core::ptr::write_volatile(reg(EXTI_BASE, EXTI_INTFR), line) };
    true
}
