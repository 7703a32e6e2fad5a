//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstraction for the Cortex-M4.
//! The task table is shared between thread mode (register, remove,
//! start) and the SysTick handler (tick); mutating thread-mode access
//! goes through a critical section so a tick never observes a
//! half-updated slot.

use cortex_m::interrupt;

/// Execute a closure within a critical section (interrupts disabled).
///
/// Interrupts are disabled on entry and restored on exit, making the
/// enclosed table operation atomic with respect to the tick handler.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|_cs| {
///     // Access the task table safely
/// });
/// ```
///
/// # Performance
/// Keep critical sections short — a long one delays the tick and skews
/// task timing. The table operations guarded here are all O(capacity)
/// over an 8-slot array.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
