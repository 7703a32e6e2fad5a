//! # TTOS — Time-Triggered Operating System
//!
//! A fixed-size, tick-driven cooperative task scheduler for ARM
//! Cortex-M4 microcontrollers.
//!
//! ## Overview
//!
//! TTOS maintains a static table of continuous, periodic and one-shot
//! tasks. A hardware timer tick decrements per-task delay countdowns
//! and marks expired tasks ready; a dispatch pass run from the main
//! loop invokes every eligible callback, synchronously and to
//! completion, in table order. There is no preemption, no priority, and
//! no per-task stack — a task is a plain function that must return
//! before anything else runs.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                   Application Tasks                     │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │   init() · register_task() · start() · dispatch()      │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │   Status Report    │  Sync Primitives  │
//! │  scheduler.rs│   report.rs        │  sync.rs          │
//! │  ─ tick()    │   ─ flags          │  ─ critical_section│
//! │  ─ dispatch()│   ─ per-task lines │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │              Task Model (task.rs)                       │
//! │   TaskSlot · TaskState · TaskKind · Schedule · Handle   │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                │
//! │        SysTick config · Tick handler · WFI idle         │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 Hardware (Thumb-2)                │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Task State Machine
//!
//! - `Stopped` — inactive; a free slot, or a periodic task waiting out
//!   its countdown.
//! - `Ready` — countdown expired; eligible for the next dispatch pass.
//! - `Running` — callback executing; reverted to `Stopped` when it
//!   returns, unless the callback changed the state itself.
//! - `RunAlways` — continuous task; eligible on every dispatch pass.
//! - `Suspended` — parked; skipped by the readiness transition until
//!   resumed.
//!
//! The tick runs in the SysTick handler and only advances timing state;
//! dispatch runs in thread mode and is the only place callbacks are
//! invoked. Registration failures (full table, duplicate callback) are
//! recoverable `Result`s; `kernel::start` refuses to enter the dispatch
//! loop — and parks the core — if any failure went unhandled.
//!
//! ## Memory Model
//!
//! - **No heap**: All state is statically allocated
//! - **No `alloc`**: Pure `core` only
//! - **Fixed-size table**: `[TaskSlot; MAX_TASKS]`
//! - **Critical sections**: `cortex_m::interrupt::free()` around
//!   thread-mode table mutation; the tick handler owns the interrupt
//!   context

#![no_std]

pub mod arch;
pub mod config;
pub mod kernel;
pub mod report;
pub mod scheduler;
pub mod sync;
pub mod task;
