//! # Scheduler
//!
//! Core scheduling logic for TTOS. Implements a time-triggered,
//! cooperative scheduler over a fixed table of task slots: a timer tick
//! advances per-task countdowns and marks tasks ready, and a dispatch
//! pass run from thread mode invokes every eligible callback to
//! completion.
//!
//! ## Tick Algorithm
//!
//! At each SysTick interrupt, for every occupied slot in index order:
//! 1. **Count down**: a non-zero `delay` is decremented.
//! 2. **Readiness**: when `delay` reaches zero, the task becomes `Ready`
//!    unless it is `RunAlways` (not gated by the countdown) or
//!    `Suspended` (parked). A task registered with delay `d` therefore
//!    fires on the d-th tick, and with delay 0 on the very next tick.
//! 3. **Re-arm**: a periodic task's `delay` is reset to `period` in the
//!    same tick that it reaches zero.
//!
//! `tick` never invokes callbacks. It touches only `delay` and `state`,
//! runs in O(capacity) with no allocation, and cannot fail.
//!
//! ## Dispatch Algorithm
//!
//! For every occupied slot in index order:
//! - `RunAlways` tasks are invoked unconditionally.
//! - `Ready` tasks are claimed (`Ready` → `Running`), invoked, and
//!   reverted to `Stopped` afterwards unless the callback changed the
//!   state itself. A one-shot task's slot is released after its
//!   callback returns.
//!
//! Dispatch order is table-index order; there is no priority or fairness
//! guarantee beyond that. Dispatch is never reentrant and every callback
//! runs to completion before the next is considered.

use core::ffi::c_void;

use crate::config::MAX_TASKS;
use crate::task::{Schedule, TaskFn, TaskKind, TaskSlot, TaskState};

// ---------------------------------------------------------------------------
// Errors and aggregate flags
// ---------------------------------------------------------------------------

/// Failures reported by the scheduler's table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// Registration attempted with every slot occupied.
    TableFull,
    /// The callback is already registered in another slot.
    DuplicateTask,
    /// A periodic schedule must have a non-zero period.
    InvalidPeriod,
    /// Slot index outside `[0, MAX_TASKS)`.
    IndexOutOfRange,
    /// The start-time aggregate check failed: an error flag is set or
    /// the task count is out of `[1, MAX_TASKS]`.
    StartupInvariantViolation,
}

/// Aggregate error conditions accumulated across table operations.
///
/// `create_failed` and `remove_failed` record the outcome of the most
/// recent registration/removal: a failure sets them, a subsequent
/// success clears them. `overflow` is sticky — once a registration has
/// been attempted beyond capacity, only a full [`Scheduler::reset`]
/// clears it. [`Scheduler::verify_start`] requires all three clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerFlags {
    /// Last registration failed (duplicate, invalid schedule, or full).
    pub create_failed: bool,

    /// Last removal failed (index out of range).
    pub remove_failed: bool,

    /// A registration was attempted beyond capacity. Sticky.
    pub overflow: bool,
}

impl SchedulerFlags {
    /// All flags clear.
    pub const fn new() -> Self {
        Self {
            create_failed: false,
            remove_failed: false,
            overflow: false,
        }
    }

    /// Whether any error condition is recorded.
    #[inline]
    pub fn any_set(&self) -> bool {
        self.create_failed || self.remove_failed || self.overflow
    }

    /// Clear every flag.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: the fixed task table plus aggregate
/// bookkeeping. Stored as a global `static mut` in `kernel.rs`; every
/// algorithm here takes `&mut self` so the core stays host-testable.
///
/// ## Design Notes
///
/// - All slots are stored inline in a fixed-size array (no heap).
/// - A slot is occupied iff its callback is present; registration fills
///   the first free slot, and `tick`/`dispatch` scan the whole table
///   and skip free slots, so holes left by `remove` are harmless.
/// - `active_count` is a running count of occupied slots and never
///   exceeds `MAX_TASKS`.
pub struct Scheduler {
    /// Fixed-size task table, indexed by slot.
    pub slots: [TaskSlot; MAX_TASKS],

    /// Number of occupied slots.
    pub active_count: usize,

    /// Aggregate error flags checked by `verify_start`.
    pub flags: SchedulerFlags,

    /// Monotonic tick counter, for diagnostics.
    pub tick_count: u64,
}

impl Scheduler {
    /// Create a scheduler with an empty table and clear flags.
    pub const fn new() -> Self {
        Self {
            slots: [TaskSlot::EMPTY; MAX_TASKS],
            active_count: 0,
            flags: SchedulerFlags::new(),
            tick_count: 0,
        }
    }

    /// Fixed maximum number of concurrently registered tasks.
    #[inline]
    pub fn capacity(&self) -> usize {
        MAX_TASKS
    }

    /// Current number of occupied slots.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Ticks elapsed since the last reset.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Release every slot and clear all bookkeeping. Infallible.
    ///
    /// Together with construction this is the table half of system
    /// initialization; hooking the tick source up is the kernel's job.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.release();
        }
        self.active_count = 0;
        self.flags.clear();
        self.tick_count = 0;
    }

    /// Register a new task.
    ///
    /// The callback identity must be unique among registered tasks; the
    /// slot index returned on success identifies the task for `remove`,
    /// `suspend` and `resume`, and is carried in the handle passed to
    /// the callback. `parameter` is forwarded untouched on every
    /// invocation (it may be null).
    ///
    /// # Returns
    /// - `Ok(index)` — the task's slot in the table
    /// - `Err(InvalidPeriod)` — periodic schedule with a zero period
    /// - `Err(TableFull)` — every slot is occupied
    /// - `Err(DuplicateTask)` — `callback` is already registered
    pub fn register(
        &mut self,
        callback: TaskFn,
        name: &'static str,
        parameter: *mut c_void,
        schedule: Schedule,
    ) -> Result<usize, SchedulerError> {
        if let Schedule::Periodic { period: 0, .. } = schedule {
            self.flags.create_failed = true;
            return Err(SchedulerError::InvalidPeriod);
        }

        if self.active_count >= MAX_TASKS {
            self.flags.create_failed = true;
            self.flags.overflow = true;
            return Err(SchedulerError::TableFull);
        }

        if self.slots.iter().any(|slot| slot.callback == Some(callback)) {
            self.flags.create_failed = true;
            return Err(SchedulerError::DuplicateTask);
        }

        for index in 0..MAX_TASKS {
            if !self.slots[index].is_occupied() {
                self.slots[index].occupy(index, callback, name, parameter, schedule);
                self.active_count += 1;
                self.flags.create_failed = false;
                return Ok(index);
            }
        }

        // Unreachable: active_count < MAX_TASKS implies a free slot.
        self.flags.create_failed = true;
        self.flags.overflow = true;
        Err(SchedulerError::TableFull)
    }

    /// Remove the task in `index`, releasing its slot.
    ///
    /// Removing an already-free slot is an idempotent success. An
    /// out-of-range index is a defined failure rather than an
    /// unchecked access.
    pub fn remove(&mut self, index: usize) -> Result<(), SchedulerError> {
        if index >= MAX_TASKS {
            self.flags.remove_failed = true;
            return Err(SchedulerError::IndexOutOfRange);
        }

        if self.slots[index].is_occupied() {
            self.slots[index].release();
            self.active_count -= 1;
        }

        self.flags.remove_failed = false;
        Ok(())
    }

    /// Park the task in `index` so it never becomes `Ready`.
    ///
    /// The countdown keeps running and re-arming while parked; only the
    /// readiness transition is skipped. Continuous tasks never leave
    /// `RunAlways` while registered, so suspending one is a no-op
    /// success, as is suspending a free slot.
    pub fn suspend(&mut self, index: usize) -> Result<(), SchedulerError> {
        if index >= MAX_TASKS {
            return Err(SchedulerError::IndexOutOfRange);
        }

        let slot = &mut self.slots[index];
        if slot.is_occupied() && slot.kind != TaskKind::Continuous {
            slot.state = TaskState::Suspended;
        }
        Ok(())
    }

    /// Return a suspended task to `Stopped`; it becomes `Ready` at the
    /// next countdown expiry. No-op success for any other state.
    pub fn resume(&mut self, index: usize) -> Result<(), SchedulerError> {
        if index >= MAX_TASKS {
            return Err(SchedulerError::IndexOutOfRange);
        }

        let slot = &mut self.slots[index];
        if slot.is_occupied() && slot.state == TaskState::Suspended {
            slot.state = TaskState::Stopped;
        }
        Ok(())
    }

    /// Advance every countdown by one tick and mark expired tasks ready.
    ///
    /// Called from the SysTick handler. Touches only `delay` and
    /// `state`, never invokes callbacks, and cannot fail.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);

        for slot in self.slots.iter_mut() {
            if !slot.is_occupied() {
                continue;
            }

            if slot.delay > 0 {
                slot.delay -= 1;
            }

            if slot.delay == 0 {
                if slot.state != TaskState::RunAlways && slot.state != TaskState::Suspended {
                    slot.state = TaskState::Ready;
                }
                if slot.period > 0 {
                    slot.delay = slot.period;
                }
            }
        }
    }

    /// Run every currently-eligible task callback, in table order.
    ///
    /// Called repeatedly from the main run loop; never reentrant.
    /// `Ready` tasks are claimed as `Running` before their callback is
    /// invoked, so a tick that fires mid-callback cannot re-mark a task
    /// that is already executing.
    pub fn dispatch(&mut self) {
        for index in 0..MAX_TASKS {
            let callback = match self.slots[index].callback {
                Some(callback) => callback,
                None => continue,
            };

            match self.slots[index].state {
                TaskState::RunAlways => {
                    callback(&mut self.slots[index].handle);
                }
                TaskState::Ready => {
                    self.slots[index].state = TaskState::Running;

                    callback(&mut self.slots[index].handle);

                    if self.slots[index].state == TaskState::Running {
                        self.slots[index].state = TaskState::Stopped;
                    }

                    if self.slots[index].kind == TaskKind::OneShot {
                        self.slots[index].release();
                        self.active_count -= 1;
                    }
                }
                _ => {}
            }
        }
    }

    /// Start-time aggregate check, run once before the dispatch loop.
    ///
    /// Succeeds only if no error flag is set and the registered task
    /// count is within `[1, MAX_TASKS]`. The caller must not enter the
    /// dispatch loop on failure.
    pub fn verify_start(&self) -> Result<(), SchedulerError> {
        if self.flags.any_set() || self.active_count == 0 || self.active_count > MAX_TASKS {
            return Err(SchedulerError::StartupInvariantViolation);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskHandle;

    fn count_hits(handle: &mut TaskHandle) {
        unsafe { *(handle.parameter as *mut u32) += 1 }
    }

    fn count_hits_b(handle: &mut TaskHandle) {
        unsafe { *(handle.parameter as *mut u32) += 10 }
    }

    fn nop_a(_: &mut TaskHandle) {}

    fn nop_b(handle: &mut TaskHandle) {
        let _ = handle.index;
    }

    fn nop_c(handle: &mut TaskHandle) {
        let _ = handle.index + 1;
    }

    fn nop_d(handle: &mut TaskHandle) {
        let _ = handle.index + 2;
    }

    fn nop_e(handle: &mut TaskHandle) {
        let _ = handle.index + 3;
    }

    fn nop_f(handle: &mut TaskHandle) {
        let _ = handle.index + 4;
    }

    fn nop_g(handle: &mut TaskHandle) {
        let _ = handle.index + 5;
    }

    fn nop_h(handle: &mut TaskHandle) {
        let _ = handle.index + 6;
    }

    fn null() -> *mut c_void {
        core::ptr::null_mut()
    }

    #[test]
    fn test_continuous_task_runs_every_dispatch() {
        let mut sched = Scheduler::new();
        let mut hits: u32 = 0;

        let index = sched
            .register(
                count_hits,
                "hb",
                &mut hits as *mut u32 as *mut c_void,
                Schedule::Continuous,
            )
            .unwrap();

        assert_eq!(sched.slots[index].state, TaskState::RunAlways);

        // No ticks at all — continuous tasks are not gated by the countdown.
        sched.dispatch();
        sched.dispatch();
        sched.dispatch();

        assert_eq!(hits, 3);
        assert_eq!(sched.slots[index].state, TaskState::RunAlways);
    }

    #[test]
    fn test_periodic_countdown_reaches_ready_on_dth_tick() {
        let mut sched = Scheduler::new();
        let index = sched
            .register(nop_a, "poll", null(), Schedule::Periodic { delay: 2, period: 5 })
            .unwrap();

        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Stopped);

        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Ready);
        // Re-armed in the same tick that the countdown expired.
        assert_eq!(sched.slots[index].delay, 5);
    }

    #[test]
    fn test_zero_delay_ready_on_first_tick() {
        let mut sched = Scheduler::new();
        let index = sched
            .register(nop_a, "now", null(), Schedule::Periodic { delay: 0, period: 3 })
            .unwrap();

        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Ready);
        assert_eq!(sched.slots[index].delay, 3);
    }

    #[test]
    fn test_dispatch_runs_ready_task_once_then_stops_it() {
        let mut sched = Scheduler::new();
        let mut hits: u32 = 0;

        let index = sched
            .register(
                count_hits,
                "poll",
                &mut hits as *mut u32 as *mut c_void,
                Schedule::Periodic { delay: 1, period: 4 },
            )
            .unwrap();

        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Ready);

        sched.dispatch();
        assert_eq!(hits, 1);
        assert_eq!(sched.slots[index].state, TaskState::Stopped);

        // Not ready again until the period elapses.
        sched.dispatch();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_duplicate_callback_rejected() {
        let mut sched = Scheduler::new();
        sched
            .register(nop_a, "first", null(), Schedule::Continuous)
            .unwrap();

        let err = sched.register(nop_a, "again", null(), Schedule::Continuous);

        assert_eq!(err, Err(SchedulerError::DuplicateTask));
        assert_eq!(sched.active_count(), 1);
        assert!(sched.flags.create_failed);
    }

    #[test]
    fn test_table_full_rejected_and_count_capped() {
        let mut sched = Scheduler::new();
        let tasks: [crate::task::TaskFn; MAX_TASKS] =
            [nop_a, nop_b, nop_c, nop_d, nop_e, nop_f, nop_g, nop_h];

        for task in tasks {
            sched.register(task, "filler", null(), Schedule::Continuous).unwrap();
        }
        assert_eq!(sched.active_count(), MAX_TASKS);

        let err = sched.register(count_hits, "extra", null(), Schedule::Continuous);

        assert_eq!(err, Err(SchedulerError::TableFull));
        assert_eq!(sched.active_count(), MAX_TASKS);
        assert!(sched.flags.overflow);
    }

    #[test]
    fn test_invalid_period_rejected() {
        let mut sched = Scheduler::new();

        let err = sched.register(nop_a, "bad", null(), Schedule::Periodic { delay: 3, period: 0 });

        assert_eq!(err, Err(SchedulerError::InvalidPeriod));
        assert_eq!(sched.active_count(), 0);
        assert!(sched.flags.create_failed);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut sched = Scheduler::new();
        let index = sched
            .register(nop_a, "gone", null(), Schedule::Continuous)
            .unwrap();

        assert_eq!(sched.remove(index), Ok(()));
        assert_eq!(sched.active_count(), 0);

        // Removing an already-free slot succeeds without underflow.
        assert_eq!(sched.remove(index), Ok(()));
        assert_eq!(sched.active_count(), 0);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut sched = Scheduler::new();

        let err = sched.remove(MAX_TASKS);

        assert_eq!(err, Err(SchedulerError::IndexOutOfRange));
        assert!(sched.flags.remove_failed);
    }

    #[test]
    fn test_removed_callback_can_be_reregistered() {
        let mut sched = Scheduler::new();
        let index = sched
            .register(nop_a, "once", null(), Schedule::Continuous)
            .unwrap();
        sched.remove(index).unwrap();

        // The duplicate check only considers occupied slots.
        assert!(sched.register(nop_a, "twice", null(), Schedule::Continuous).is_ok());
    }

    #[test]
    fn test_registration_reuses_freed_slot() {
        let mut sched = Scheduler::new();
        sched.register(nop_a, "a", null(), Schedule::Continuous).unwrap();
        let middle = sched.register(nop_b, "b", null(), Schedule::Continuous).unwrap();
        sched.register(nop_c, "c", null(), Schedule::Continuous).unwrap();

        sched.remove(middle).unwrap();
        let reused = sched.register(nop_d, "d", null(), Schedule::Continuous).unwrap();

        assert_eq!(reused, middle);
        assert_eq!(sched.slots[reused].handle.index, middle);
        assert_eq!(sched.active_count(), 3);
    }

    #[test]
    fn test_one_shot_fires_once_and_releases_slot() {
        let mut sched = Scheduler::new();
        let mut hits: u32 = 0;

        let index = sched
            .register(
                count_hits,
                "boot",
                &mut hits as *mut u32 as *mut c_void,
                Schedule::OneShot { delay: 3 },
            )
            .unwrap();

        sched.tick();
        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Stopped);
        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Ready);

        sched.dispatch();
        assert_eq!(hits, 1);
        assert!(!sched.slots[index].is_occupied());
        assert_eq!(sched.active_count(), 0);

        // Never fires again.
        for _ in 0..10 {
            sched.tick();
            sched.dispatch();
        }
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_suspend_skips_readiness_and_resume_restores_it() {
        let mut sched = Scheduler::new();
        let index = sched
            .register(nop_a, "pause", null(), Schedule::Periodic { delay: 1, period: 2 })
            .unwrap();

        sched.suspend(index).unwrap();

        // The countdown keeps re-arming but readiness is skipped.
        for _ in 0..6 {
            sched.tick();
            assert_eq!(sched.slots[index].state, TaskState::Suspended);
        }

        sched.resume(index).unwrap();
        assert_eq!(sched.slots[index].state, TaskState::Stopped);

        sched.tick();
        sched.tick();
        assert_eq!(sched.slots[index].state, TaskState::Ready);
    }

    #[test]
    fn test_suspend_continuous_is_noop() {
        let mut sched = Scheduler::new();
        let index = sched
            .register(nop_a, "hb", null(), Schedule::Continuous)
            .unwrap();

        assert_eq!(sched.suspend(index), Ok(()));
        assert_eq!(sched.slots[index].state, TaskState::RunAlways);
    }

    #[test]
    fn test_suspend_out_of_range() {
        let mut sched = Scheduler::new();
        assert_eq!(sched.suspend(MAX_TASKS), Err(SchedulerError::IndexOutOfRange));
        assert_eq!(sched.resume(MAX_TASKS), Err(SchedulerError::IndexOutOfRange));
    }

    #[test]
    fn test_verify_start_requires_tasks_and_clear_flags() {
        let mut sched = Scheduler::new();

        // Empty table never starts.
        assert_eq!(
            sched.verify_start(),
            Err(SchedulerError::StartupInvariantViolation)
        );

        sched.register(nop_a, "a", null(), Schedule::Continuous).unwrap();
        assert_eq!(sched.verify_start(), Ok(()));

        // A failed registration leaves the start gate closed...
        let _ = sched.register(nop_a, "dup", null(), Schedule::Continuous);
        assert_eq!(
            sched.verify_start(),
            Err(SchedulerError::StartupInvariantViolation)
        );

        // ...until a later registration succeeds.
        sched.register(nop_b, "b", null(), Schedule::Continuous).unwrap();
        assert_eq!(sched.verify_start(), Ok(()));
    }

    #[test]
    fn test_tick_on_empty_table() {
        let mut sched = Scheduler::new();
        sched.tick();
        sched.tick();
        assert_eq!(sched.tick_count(), 2);
        assert_eq!(sched.active_count(), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sched = Scheduler::new();
        sched.register(nop_a, "a", null(), Schedule::Continuous).unwrap();
        let _ = sched.remove(MAX_TASKS);
        sched.tick();

        sched.reset();

        assert_eq!(sched.active_count(), 0);
        assert!(!sched.flags.any_set());
        assert_eq!(sched.tick_count(), 0);
        assert!(sched.slots.iter().all(|slot| !slot.is_occupied()));
    }

    #[test]
    fn test_end_to_end_continuous_and_periodic() {
        let mut sched = Scheduler::new();
        let mut a_hits: u32 = 0;
        let mut b_hits: u32 = 0;

        // Task A: continuous. Task B: first fires after 2 ticks, then
        // every 5 ticks.
        sched
            .register(
                count_hits,
                "a",
                &mut a_hits as *mut u32 as *mut c_void,
                Schedule::Continuous,
            )
            .unwrap();
        let b = sched
            .register(
                count_hits_b,
                "b",
                &mut b_hits as *mut u32 as *mut c_void,
                Schedule::Periodic { delay: 2, period: 5 },
            )
            .unwrap();

        sched.tick();
        sched.tick();
        assert_eq!(sched.slots[b].state, TaskState::Ready);
        assert_eq!(sched.slots[b].delay, 5);

        sched.dispatch();
        assert_eq!(a_hits, 1);
        assert_eq!(b_hits, 10);
        assert_eq!(sched.slots[b].state, TaskState::Stopped);

        for _ in 0..5 {
            sched.tick();
        }
        assert_eq!(sched.slots[b].state, TaskState::Ready);

        sched.dispatch();
        assert_eq!(a_hits, 2);
        assert_eq!(b_hits, 20);
    }
}
