//! Scheduling of restarts and learned clause reduction.
use partial_ref::{partial, PartialRef};

use crate::cdcl::conflict_step;
use crate::clause::reduce::reduce_learned;
use crate::context::{parts::*, Context};
use crate::prop::restart;
use crate::state::SearchState;

mod luby;

use luby::LubySequence;

/// Scheduling of restarts and reductions, counted in conflicts.
#[derive(Clone)]
pub struct Schedule {
    pub conflicts: u64,
    pub restarts: u64,
    next_restart: u64,
    next_reduce: u64,
    luby: LubySequence,
    restart_scale: u64,
    reduce_interval: u64,
}

impl Default for Schedule {
    fn default() -> Schedule {
        let config = crate::config::OracleConfig::default();
        let mut schedule = Schedule {
            conflicts: 0,
            restarts: 0,
            next_restart: 0,
            next_reduce: 0,
            luby: LubySequence::default(),
            restart_scale: 0,
            reduce_interval: 0,
        };
        schedule.configure(config.luby_restart_interval_scale, config.reduce_interval);
        schedule
    }
}

impl Schedule {
    /// Change the restart scale and reduction interval.
    pub fn configure(&mut self, restart_scale: u64, reduce_interval: u64) {
        self.restart_scale = restart_scale.max(1);
        self.reduce_interval = reduce_interval.max(1);
        self.next_restart = self.conflicts + self.restart_scale * self.luby.advance();
        self.next_reduce = self.conflicts + self.reduce_interval;
    }
}

/// Perform one step of the schedule.
///
/// Returns `false` when the satisfiability state is known.
pub fn schedule_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseActivityP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut ScheduleP,
        mut SearchStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) -> bool {
    let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);

    if *ctx.part(SearchStateP) != SearchState::Unknown {
        return false;
    }

    if schedule.conflicts >= schedule.next_restart {
        restart(ctx.borrow());
        schedule.restarts += 1;
        schedule.next_restart =
            schedule.conflicts + schedule.restart_scale * schedule.luby.advance();
    }

    if schedule.conflicts >= schedule.next_reduce {
        reduce_learned(ctx.borrow());
        schedule.next_reduce = schedule.conflicts + schedule.reduce_interval;
    }

    if conflict_step(ctx.borrow()) {
        schedule.conflicts += 1;
    }
    true
}
