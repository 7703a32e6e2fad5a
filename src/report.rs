//! # Status Report
//!
//! Human-readable scheduler diagnostics: aggregate flags, task count,
//! and one block per registered task. Read-only consumer of the
//! scheduler state — emitting a report never disturbs scheduling.
//!
//! Output goes through `defmt` when the `defmt` feature is enabled and
//! is compiled out entirely otherwise, so the library carries no logger
//! requirement on host builds.

use crate::scheduler::Scheduler;

#[cfg(feature = "defmt")]
use defmt::warn;

// Stub macro when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

/// Print the scheduler status report.
///
/// Emitted unconditionally by `kernel::start` so every boot log carries
/// the task table; also callable on demand from a diagnostic task.
pub fn report_status(scheduler: &Scheduler) {
    warn!("***********************************");
    warn!("**    SCHEDULER REPORT STATUS    **");
    warn!("***********************************");
    warn!(" v{}", crate::config::SCHEDULER_VERSION);
    warn!("***********************************");
    warn!("Tasks registered:\t{}", scheduler.active_count());
    warn!("Ticks elapsed:\t{}", scheduler.tick_count());
    warn!("***********************************");
    warn!("Scheduler status flags:");
    warn!("create_failed:\t{}", scheduler.flags.create_failed);
    warn!("remove_failed:\t{}", scheduler.flags.remove_failed);
    warn!("overflow:\t{}", scheduler.flags.overflow);

    for slot in scheduler.slots.iter() {
        if !slot.is_occupied() {
            continue;
        }
        warn!("***********************************");
        warn!("Task name:\t{}", slot.name);
        warn!("Task state:\t{}", slot.state);
        warn!("Task kind:\t{}", slot.kind);
        warn!("Task period:\t{}", slot.period);
        warn!("Task slot:\t{}", slot.handle.index);
    }

    warn!("***********************************");
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Schedule, TaskHandle};

    fn nop(_: &mut TaskHandle) {}

    #[test]
    fn test_report_leaves_scheduler_untouched() {
        let mut sched = Scheduler::new();
        sched
            .register(nop, "hb", core::ptr::null_mut(), Schedule::Continuous)
            .unwrap();
        sched.tick();

        report_status(&sched);

        assert_eq!(sched.active_count(), 1);
        assert_eq!(sched.tick_count(), 1);
        assert!(!sched.flags.any_set());
    }
}
