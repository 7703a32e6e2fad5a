//! # Task Model
//!
//! Defines the task model for TTOS. Each task is a plain callback with
//! timing parameters; all of its state lives in a fixed table slot owned
//! by the scheduler. Tasks run to completion on every invocation — there
//! are no per-task stacks and no preemption.

use core::ffi::c_void;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Execution state of a task in the scheduler's state machine.
///
/// ```text
///              tick(): delay == 0            dispatch()
///   ┌─────────┐ ───────────────► ┌───────┐ ────────────► ┌─────────┐
///   │ Stopped │                  │ Ready │               │ Running │
///   └─────────┘ ◄─────────────── └───────┘               └─────────┘
///        ▲        callback returned (unless it changed state)  │
///        └─────────────────────────────────────────────────────┘
///
///   RunAlways — continuous tasks; entered at registration, never left.
///   Suspended — parked; skipped by tick's readiness transition.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Inactive. A free slot, or a periodic task waiting for its
    /// countdown to expire.
    Stopped,
    /// Countdown reached zero; eligible for the next dispatch pass.
    Ready,
    /// Callback is executing right now. Reverted to `Stopped` after the
    /// callback returns, unless the callback changed the state itself.
    Running,
    /// Continuous task; runs on every dispatch pass regardless of the
    /// tick countdown. Never left while the task is registered.
    RunAlways,
    /// Parked by task logic or external control. The readiness
    /// transition skips this state, so the task never becomes `Ready`
    /// until resumed.
    Suspended,
}

// ---------------------------------------------------------------------------
// Task kind and schedule
// ---------------------------------------------------------------------------

/// What the slot does once its countdown expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskKind {
    /// Eligible on every dispatch pass, not gated by the countdown.
    Continuous,
    /// Becomes eligible every `period` ticks; re-armed automatically.
    Periodic,
    /// Becomes eligible once, then the slot is released after the
    /// callback returns.
    OneShot,
}

/// Timing requested at registration.
///
/// The kind is explicit rather than inferred from a zero period, so a
/// one-shot task is expressible through the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run on every dispatch pass for as long as the task is registered.
    Continuous,
    /// First eligible after `delay` ticks (0 = on the very next tick
    /// pass), then once every `period` ticks. `period` must be non-zero.
    Periodic { delay: u32, period: u32 },
    /// Eligible once, after `delay` ticks.
    OneShot { delay: u32 },
}

// ---------------------------------------------------------------------------
// Handle and callback
// ---------------------------------------------------------------------------

/// Opaque per-task capability passed to the callback on every invocation.
///
/// Carries the task's slot index (usable with the kernel API to remove,
/// suspend or resume the task from inside its own callback) and the
/// caller-supplied parameter pointer.
#[derive(Debug)]
pub struct TaskHandle {
    /// Slot index of the task in the scheduler table.
    pub index: usize,

    /// Caller-supplied parameter, forwarded untouched. Null for tasks
    /// registered without one.
    pub parameter: *mut c_void,
}

/// Task callback. Must run to completion; there is no yield point and no
/// way to block inside a task.
pub type TaskFn = fn(&mut TaskHandle);

// ---------------------------------------------------------------------------
// Table slot
// ---------------------------------------------------------------------------

/// One fixed position in the task table.
///
/// A slot is occupied iff `callback` is `Some`; a free slot keeps every
/// other field at its neutral value. Slots are stored inline in a static
/// array — no heap allocation anywhere in the scheduler.
pub struct TaskSlot {
    /// Task entry point. `None` marks the slot as free.
    pub callback: Option<TaskFn>,

    /// Human-readable identifier, for the status report only.
    pub name: &'static str,

    /// Ticks remaining until the next readiness transition. Counted
    /// down by `tick` while the slot is occupied.
    pub delay: u32,

    /// Re-arm interval in ticks. Zero for continuous and one-shot tasks.
    pub period: u32,

    /// Continuous, periodic or one-shot.
    pub kind: TaskKind,

    /// Current position in the task state machine.
    pub state: TaskState,

    /// Handle passed to the callback on every invocation.
    pub handle: TaskHandle,
}

// Safety: TaskSlot contains a raw pointer (handle.parameter) supplied by
// the registering caller. The scheduler never dereferences it; it is
// forwarded to the callback, and all slot access goes through critical
// sections or the single-threaded dispatch loop.
unsafe impl Send for TaskSlot {}
unsafe impl Sync for TaskSlot {}

impl TaskSlot {
    /// A free slot. Used to initialize the static table.
    pub const EMPTY: Self = Self {
        callback: None,
        name: "",
        delay: 0,
        period: 0,
        kind: TaskKind::Periodic,
        state: TaskState::Stopped,
        handle: TaskHandle {
            index: 0,
            parameter: core::ptr::null_mut(),
        },
    };

    /// Whether the slot currently holds a task.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.callback.is_some()
    }

    /// Occupy this slot with a new task.
    ///
    /// Continuous tasks start in `RunAlways`; periodic and one-shot
    /// tasks start in `Stopped` and wait for their countdown.
    pub fn occupy(
        &mut self,
        index: usize,
        callback: TaskFn,
        name: &'static str,
        parameter: *mut c_void,
        schedule: Schedule,
    ) {
        let (kind, delay, period, state) = match schedule {
            Schedule::Continuous => (TaskKind::Continuous, 0, 0, TaskState::RunAlways),
            Schedule::Periodic { delay, period } => {
                (TaskKind::Periodic, delay, period, TaskState::Stopped)
            }
            Schedule::OneShot { delay } => (TaskKind::OneShot, delay, 0, TaskState::Stopped),
        };

        self.callback = Some(callback);
        self.name = name;
        self.delay = delay;
        self.period = period;
        self.kind = kind;
        self.state = state;
        self.handle.index = index;
        self.handle.parameter = parameter;
    }

    /// Release the slot, resetting every field to its neutral value.
    pub fn release(&mut self) {
        *self = Self::EMPTY;
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut TaskHandle) {}

    #[test]
    fn test_empty_slot_is_free() {
        let slot = TaskSlot::EMPTY;
        assert!(!slot.is_occupied());
        assert_eq!(slot.state, TaskState::Stopped);
        assert_eq!(slot.delay, 0);
        assert_eq!(slot.period, 0);
        assert!(slot.handle.parameter.is_null());
    }

    #[test]
    fn test_occupy_continuous() {
        let mut slot = TaskSlot::EMPTY;
        slot.occupy(3, noop, "hb", core::ptr::null_mut(), Schedule::Continuous);

        assert!(slot.is_occupied());
        assert_eq!(slot.kind, TaskKind::Continuous);
        assert_eq!(slot.state, TaskState::RunAlways);
        assert_eq!(slot.delay, 0);
        assert_eq!(slot.period, 0);
        assert_eq!(slot.handle.index, 3);
    }

    #[test]
    fn test_occupy_periodic() {
        let mut slot = TaskSlot::EMPTY;
        slot.occupy(
            0,
            noop,
            "poll",
            core::ptr::null_mut(),
            Schedule::Periodic { delay: 2, period: 5 },
        );

        assert_eq!(slot.kind, TaskKind::Periodic);
        assert_eq!(slot.state, TaskState::Stopped);
        assert_eq!(slot.delay, 2);
        assert_eq!(slot.period, 5);
    }

    #[test]
    fn test_occupy_one_shot() {
        let mut slot = TaskSlot::EMPTY;
        slot.occupy(
            1,
            noop,
            "boot",
            core::ptr::null_mut(),
            Schedule::OneShot { delay: 10 },
        );

        assert_eq!(slot.kind, TaskKind::OneShot);
        assert_eq!(slot.state, TaskState::Stopped);
        assert_eq!(slot.delay, 10);
        assert_eq!(slot.period, 0);
    }

    #[test]
    fn test_release_resets_all_fields() {
        let mut slot = TaskSlot::EMPTY;
        let mut value: u32 = 7;
        slot.occupy(
            4,
            noop,
            "tmp",
            &mut value as *mut u32 as *mut c_void,
            Schedule::Periodic { delay: 1, period: 1 },
        );
        slot.state = TaskState::Ready;

        slot.release();

        assert!(!slot.is_occupied());
        assert_eq!(slot.name, "");
        assert_eq!(slot.state, TaskState::Stopped);
        assert_eq!(slot.handle.index, 0);
        assert!(slot.handle.parameter.is_null());
    }
}
