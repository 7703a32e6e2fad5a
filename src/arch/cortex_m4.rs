//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) processor:
//! SysTick timer configuration and the tick interrupt handler. This is
//! the external tick source the scheduler core is specified against —
//! `kernel::init` "registers" the tick callback by configuring SysTick,
//! whose exception vector is statically bound to the handler below.
//!
//! There is no context switching here: TTOS is run-to-completion
//! cooperative, so the only interrupt the scheduler owns is the tick.

use cortex_m::peripheral::syst::SystClkSource;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer for the scheduler tick.
///
/// Sets up SysTick to fire at `TICK_HZ` using the processor clock. Each
/// tick triggers `SysTick` which calls `Scheduler::tick()`. Enabling
/// the interrupt is the last step, so the handler never runs against an
/// unconfigured timer.
///
/// # Parameters
/// - `syst`: Mutable reference to the SysTick peripheral
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set SysTick to the lowest interrupt priority.
///
/// The tick only advances countdowns; application ISRs keep their
/// real-time behavior by outranking it. Priority 0xFF is the lowest on
/// a Cortex-M4 with 4 priority bits (effectively 0xF0).
pub fn set_tick_priority() {
    unsafe {
        // System Handler Priority Register 3 (SHPR3): 0xE000_ED20
        // Bits [31:24] = SysTick priority
        let shpr3: *mut u32 = 0xE000_ED20 as *mut u32;
        let val = core::ptr::read_volatile(shpr3);
        let val = val | (0xFF << 24);
        core::ptr::write_volatile(shpr3, val);
    }
}

// ---------------------------------------------------------------------------
// Idle primitive
// ---------------------------------------------------------------------------

/// Sleep until the next interrupt.
///
/// The run loop calls this between dispatch passes; the next SysTick
/// (or any application interrupt) wakes the core.
#[inline]
pub fn wait_for_tick() {
    cortex_m::asm::wfi();
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler — scheduler tick entry point.
///
/// Called at `TICK_HZ` frequency. Advances every task countdown and
/// marks expired tasks ready; never invokes task callbacks. This is the
/// only scheduler operation that runs in interrupt context.
///
/// # Safety
/// `kernel::init` publishes `SCHEDULER_PTR` before enabling the SysTick
/// interrupt, so the pointer is always valid here.
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    scheduler.tick();
}
