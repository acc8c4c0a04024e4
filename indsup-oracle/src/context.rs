//! Central oracle data structure.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use crate::analyze_conflict::AnalyzeConflict;
use crate::assumptions::Assumptions;
use crate::binary::BinaryClauses;
use crate::clause::{ClauseActivity, ClauseDb};
use crate::vsids::Vsids;
use crate::prop::{Assignment, ImplGraph, Trail, Watchlists};
use crate::schedule::Schedule;
use crate::state::SearchState;
use crate::tmp::TmpData;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub AnalyzeConflictP: AnalyzeConflict);
    part!(pub AssignmentP: Assignment);
    part!(pub AssumptionsP: Assumptions);
    part!(pub BinaryClausesP: BinaryClauses);
    part!(pub ClauseActivityP: ClauseActivity);
    part!(pub ClauseDbP: ClauseDb);
    part!(pub ImplGraphP: ImplGraph);
    part!(pub ScheduleP: Schedule);
    part!(pub SearchStateP: SearchState);
    part!(pub TmpDataP: TmpData);
    part!(pub TrailP: Trail);
    part!(pub VsidsP: Vsids);
    part!(pub WatchlistsP: Watchlists);
}

pub use parts::*;

/// All data kept by the oracle.
///
/// Functions operating on several fields take partial references, which documents their data
/// dependencies and keeps the borrow checker happy.
#[derive(PartialRefTarget, Default, Clone)]
pub struct Context {
    #[part(AnalyzeConflictP)]
    analyze_conflict: AnalyzeConflict,
    #[part(AssignmentP)]
    assignment: Assignment,
    #[part(AssumptionsP)]
    assumptions: Assumptions,
    #[part(BinaryClausesP)]
    binary_clauses: BinaryClauses,
    #[part(ClauseActivityP)]
    clause_activity: ClauseActivity,
    #[part(ClauseDbP)]
    clause_db: ClauseDb,
    #[part(ImplGraphP)]
    impl_graph: ImplGraph,
    #[part(ScheduleP)]
    schedule: Schedule,
    #[part(SearchStateP)]
    search_state: SearchState,
    #[part(TmpDataP)]
    tmp_data: TmpData,
    #[part(TrailP)]
    trail: Trail,
    #[part(VsidsP)]
    vsids: Vsids,
    #[part(WatchlistsP)]
    watchlists: Watchlists,
}

/// Update structures for a new variable count.
pub fn set_var_count(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut BinaryClausesP,
        mut ImplGraphP,
        mut TmpDataP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    ctx.part_mut(AnalyzeConflictP).set_var_count(count);
    ctx.part_mut(AssignmentP).set_var_count(count);
    ctx.part_mut(BinaryClausesP).set_var_count(count);
    ctx.part_mut(ImplGraphP).set_var_count(count);
    ctx.part_mut(TmpDataP).set_var_count(count);
    ctx.part_mut(VsidsP).set_var_count(count);
    ctx.part_mut(WatchlistsP).set_var_count(count);
}

/// Increases the variable count to at least the given value.
pub fn ensure_var_count(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut BinaryClausesP,
        mut ImplGraphP,
        mut TmpDataP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    if count > ctx.part(AssignmentP).var_count() {
        set_var_count(ctx.borrow(), count)
    }
}
