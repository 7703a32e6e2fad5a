//! # TTOS Configuration
//!
//! Compile-time constants governing the scheduler and system behavior.
//! All limits are fixed at compile time — no dynamic allocation.

/// Maximum number of tasks the table can hold simultaneously.
/// This bounds the static slot array; `active_count` never exceeds it.
pub const MAX_TASKS: usize = 8;

/// SysTick frequency in Hz. Determines the scheduler tick granularity:
/// all task delays and periods are expressed in these ticks. Higher
/// values give finer timing at the cost of increased interrupt overhead.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Scheduler version string, printed by the status report.
pub const SCHEDULER_VERSION: &str = "1.0.0";
