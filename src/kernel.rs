//! # Kernel
//!
//! Top-level initialization and public API for TTOS.
//!
//! The kernel manages the global scheduler instance, provides the task
//! lifecycle API, and enforces the startup policy. Mutating calls are
//! wrapped in critical sections so they are safe against the SysTick
//! handler; `dispatch` runs unlocked, as the tick only touches per-task
//! `delay`/`state` fields and dispatch claims a task (`Ready` →
//! `Running`) before invoking it.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init(&mut SYST)    ← Clear table, hook tick source
//!         ├─► kernel::register_task()    ← Register tasks (×N)
//!         ├─► kernel::start()            ← Readiness gate + status report
//!         └─► loop {
//!               kernel::dispatch();      ← Run eligible callbacks
//!               arch::wait_for_tick();   ← Sleep until next SysTick
//!             }
//! ```
//!
//! `start` is deliberately fail-safe: if any table operation failed or
//! no task is registered, it logs the report and parks the core forever
//! rather than entering the dispatch loop with an inconsistent table.

use core::ffi::c_void;

use crate::arch::cortex_m4;
use crate::report;
use crate::scheduler::{Scheduler, SchedulerError};
use crate::sync;
use crate::task::{Schedule, TaskFn};

#[cfg(feature = "defmt")]
use defmt::error;

// Stub macro when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($($arg:tt)*) => {{}};
}

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Global scheduler instance.
///
/// # Safety
/// Accessed via `SCHEDULER_PTR` which is set during `init()`.
/// All access is through critical sections or from the SysTick handler
/// (where execution is already serialized by interrupt priority).
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Raw pointer to the global scheduler. Used by the arch layer
/// (SysTick handler) which cannot easily use references.
///
/// # Safety
/// Set once during `init()`, read from ISR context.
#[no_mangle]
pub static mut SCHEDULER_PTR: *mut Scheduler = core::ptr::null_mut();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the TTOS kernel.
///
/// Clears the task table, publishes the scheduler pointer for ISR
/// access, and hooks the SysTick tick source up to the scheduler
/// (configures the timer and pins it to the lowest interrupt priority).
///
/// Must be called exactly once, from the main thread, before any other
/// kernel function. The table is cleared before the timer is enabled,
/// so the first tick always observes a consistent table.
pub fn init(syst: &mut cortex_m::peripheral::SYST) {
    unsafe {
        SCHEDULER.reset();
        SCHEDULER_PTR = &mut SCHEDULER as *mut Scheduler;
    }

    cortex_m4::set_tick_priority();
    cortex_m4::configure_systick(syst);
}

/// Register a task with the scheduler.
///
/// # Parameters
/// - `callback`: Task entry point, invoked on every dispatch the task
///   is eligible for. Must be unique among registered tasks.
/// - `name`: Identifier shown in the status report.
/// - `parameter`: Forwarded to the callback in its handle; may be null.
/// - `schedule`: Continuous, periodic or one-shot timing.
///
/// # Returns
/// - `Ok(index)`: The task's slot in the table.
/// - `Err(_)`: See [`SchedulerError`]; the failure is also recorded in
///   the aggregate flags checked by [`start`].
///
/// # Example
/// ```ignore
/// kernel::register_task(
///     poll_sensors,
///     "sensor-poll",
///     core::ptr::null_mut(),
///     Schedule::Periodic { delay: 0, period: 10 },
/// ).expect("Failed to register sensor-poll");
/// ```
pub fn register_task(
    callback: TaskFn,
    name: &'static str,
    parameter: *mut c_void,
    schedule: Schedule,
) -> Result<usize, SchedulerError> {
    sync::critical_section(|_cs| unsafe {
        (*SCHEDULER_PTR).register(callback, name, parameter, schedule)
    })
}

/// Remove the task in `index`, releasing its slot. Idempotent for an
/// already-free slot.
pub fn remove_task(index: usize) -> Result<(), SchedulerError> {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).remove(index) })
}

/// Park the task in `index` so it is skipped by the readiness
/// transition until resumed. A task may suspend itself from its own
/// callback using the index carried in its handle.
pub fn suspend_task(index: usize) -> Result<(), SchedulerError> {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).suspend(index) })
}

/// Undo [`suspend_task`]; the task becomes ready again at its next
/// countdown expiry.
pub fn resume_task(index: usize) -> Result<(), SchedulerError> {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).resume(index) })
}

/// One-time readiness gate, called after all tasks are registered and
/// before the dispatch loop.
///
/// Emits the status report, then verifies the start-time invariants
/// (no error flag set, task count within `[1, capacity]`). On success
/// it returns and the caller may enter the dispatch loop. On failure
/// the table is not trustworthy: the error is logged and the core is
/// parked in WFI forever.
pub fn start() {
    let verdict = sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).verify_start() });

    unsafe {
        report::report_status(&*SCHEDULER_PTR);
    }

    if verdict.is_err() {
        error!("scheduler start error.");
        loop {
            cortex_m::asm::wfi();
        }
    }
}

/// Run one dispatch pass: invoke every currently-eligible task
/// callback, in table order.
///
/// Called repeatedly from the main run loop, and only from there —
/// never from an ISR, never reentrantly. Callbacks run with interrupts
/// enabled; the tick may fire mid-pass and mark further tasks ready,
/// which the next pass picks up.
pub fn dispatch() {
    unsafe {
        (*SCHEDULER_PTR).dispatch();
    }
}

/// Print the scheduler status report on demand.
///
/// The same report `start` emits; exposed separately so firmware can
/// dump scheduler state from a diagnostic task or a fault handler.
pub fn report_status() {
    unsafe {
        report::report_status(&*SCHEDULER_PTR);
    }
}
