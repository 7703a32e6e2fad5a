//! # TTOS Example Firmware
//!
//! Demonstrates the time-triggered scheduler with four tasks covering
//! every task kind:
//!
//! | Task | Kind | Timing | Behavior |
//! |------|------|--------|----------|
//! | `heartbeat` | Continuous | every dispatch pass | Bumps a liveness counter via its handle parameter |
//! | `sensor_poll` | Periodic | every 10 ticks | Accumulates a simulated sensor reading |
//! | `blink` | Periodic | every 500 ticks | Toggles an LED state; suspends itself after 10 toggles |
//! | `boot_marker` | OneShot | 1 tick after start | Records that startup completed, then its slot is released |
//!
//! At `TICK_HZ` = 1000 the blink task runs at 1 Hz and the sensor poll
//! at 100 Hz. The run loop sleeps between dispatch passes, so the core
//! idles in WFI whenever no task is eligible.

#![no_std]
#![no_main]

use core::ffi::c_void;

use cortex_m_rt::entry;
use panic_halt as _;

use ttos::arch::cortex_m4;
use ttos::kernel;
use ttos::task::{Schedule, TaskHandle};

// ---------------------------------------------------------------------------
// Task state
// ---------------------------------------------------------------------------

static mut HEARTBEATS: u32 = 0;
static mut LUX_ACCUM: u32 = 0;
static mut LED_ON: bool = false;
static mut BLINKS: u32 = 0;
static mut BOOTED: bool = false;

// ---------------------------------------------------------------------------
// Task entry points
// ---------------------------------------------------------------------------

/// **Heartbeat** (continuous)
///
/// Runs on every dispatch pass, proving the run loop is alive. The
/// counter it bumps arrives through the handle's parameter pointer —
/// the task body itself holds no state.
fn heartbeat(handle: &mut TaskHandle) {
    let beats = handle.parameter as *mut u32;
    unsafe { *beats = (*beats).wrapping_add(1) };
}

/// **Sensor poll** (periodic, 10 ticks)
///
/// Simulates a 100 Hz sensor sampling loop. A real board would read an
/// ADC or an I2C device here; the important property is that the body
/// is short and returns well before the next tick.
fn sensor_poll(_handle: &mut TaskHandle) {
    unsafe { LUX_ACCUM = LUX_ACCUM.wrapping_add(42) };
}

/// **Blink** (periodic, 500 ticks)
///
/// Toggles an LED state at 1 Hz. After ten toggles it parks itself via
/// the kernel suspend API, using the slot index carried in its own
/// handle — the table slot stays registered and the task could be
/// resumed later by external control.
fn blink(handle: &mut TaskHandle) {
    unsafe {
        LED_ON = !LED_ON;
        BLINKS += 1;
        if BLINKS >= 10 {
            let _ = kernel::suspend_task(handle.index);
        }
    }
}

/// **Boot marker** (one-shot, 1 tick)
///
/// Fires once shortly after the scheduler starts, records that startup
/// completed, and is then removed from the table automatically.
fn boot_marker(_handle: &mut TaskHandle) {
    unsafe { BOOTED = true };
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Initializes the kernel, registers the task
/// set, passes the startup gate, and runs the dispatch loop forever.
#[entry]
fn main() -> ! {
    // Take ownership of core peripherals
    let mut cp = cortex_m::Peripherals::take().unwrap();

    // Clear the table and hook up the SysTick tick source
    kernel::init(&mut cp.SYST);

    kernel::register_task(
        heartbeat,
        "heartbeat",
        unsafe { &mut HEARTBEATS as *mut u32 as *mut c_void },
        Schedule::Continuous,
    )
    .expect("Failed to register heartbeat");

    kernel::register_task(
        sensor_poll,
        "sensor-poll",
        core::ptr::null_mut(),
        Schedule::Periodic { delay: 0, period: 10 },
    )
    .expect("Failed to register sensor-poll");

    kernel::register_task(
        blink,
        "blink",
        core::ptr::null_mut(),
        Schedule::Periodic { delay: 500, period: 500 },
    )
    .expect("Failed to register blink");

    kernel::register_task(
        boot_marker,
        "boot-marker",
        core::ptr::null_mut(),
        Schedule::OneShot { delay: 1 },
    )
    .expect("Failed to register boot-marker");

    // Readiness gate: prints the status report, parks on any setup error
    kernel::start();

    loop {
        kernel::dispatch();
        cortex_m4::wait_for_tick();
    }
}
