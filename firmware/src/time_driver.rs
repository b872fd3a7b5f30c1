//! Embassy time driver on the 1 ms SysTick, plus the critical-section
//! implementation for the single-core RISC-V target

use core::cell::Cell;
use critical_section::Mutex;
use embassy_time_driver::{AlarmHandle, Driver};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};

struct Alarm {
    at: Cell<u64>,
    callback: Cell<Option<(fn(*mut ()), *mut ())>>,
}

// Only touched inside critical sections on a single core
unsafe impl Send for Alarm {}

/// One-alarm driver counting SysTick interrupts (1 tick = 1 ms)
pub struct SysTickDriver {
    ticks: AtomicU64,
    allocated: AtomicBool,
    alarm: Mutex<Alarm>,
}

impl SysTickDriver {
    const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            allocated: AtomicBool::new(false),
            alarm: Mutex::new(Alarm {
                at: Cell::new(u64::MAX),
                callback: Cell::new(None),
            }),
        }
    }

    /// Advance one tick and fire the alarm if it is due
    /// (called from the SysTick interrupt)
    fn tick(&self) {
        let now = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let due = critical_section::with(|cs| {
            let alarm = self.alarm.borrow(cs);
            if alarm.at.get() <= now {
                alarm.at.set(u64::MAX);
                alarm.callback.get()
            } else {
                None
            }
        });
        if let Some((callback, ctx)) = due {
            callback(ctx);
        }
    }
}

impl Driver for SysTickDriver {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        if self.allocated.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(AlarmHandle::new(0))
        }
    }

    fn set_alarm_callback(&self, _alarm: AlarmHandle, callback: fn(*mut ()), ctx: *mut ()) {
        critical_section::with(|cs| self.alarm.borrow(cs).callback.set(Some((callback, ctx))));
    }

    fn set_alarm(&self, _alarm: AlarmHandle, timestamp: u64) -> bool {
        critical_section::with(|cs| {
            if timestamp <= self.now() {
                false
            } else {
                self.alarm.borrow(cs).at.set(timestamp);
                true
            }
        })
    }
}

embassy_time_driver::time_driver_impl!(static DRIVER: SysTickDriver = SysTickDriver::new());

/// SysTick interrupt body for the time base
pub fn on_systick() {
    DRIVER.tick();
}

critical_section::set_impl!(RiscvCriticalSection);

struct RiscvCriticalSection;

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let enabled = riscv::register::mstatus::read().mie();
        riscv::interrupt::disable();
        enabled as u8
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled != 0 {
            riscv::interrupt::enable();
        }
    }
}
