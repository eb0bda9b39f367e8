//! Sequential reductions that feed each other through a named store.

use super::loader::RunSource;
use super::reduction::{ReductionInputs, SansReduction};
use crate::common::config::{PlanEntry, ReductionPlan};
use crate::domain::SansResult;
use crate::workspace::WorkspaceStore;
use tracing::{debug, info};

/// Runs every reduction of `plan` in order. Auxiliary inputs are looked up in `store`
/// first and loaded from `source` otherwise; every output lands in `store`.
///
/// Returns the names of the produced workspaces in production order.
pub fn run_plan<S: RunSource + ?Sized>(
    plan: &ReductionPlan,
    source: &S,
    store: &mut WorkspaceStore,
) -> SansResult<Vec<String>> {
    let mut produced = Vec::new();
    for (index, entry) in plan.reductions.iter().enumerate() {
        info!(
            step = index + 1,
            total = plan.reductions.len(),
            process = %entry.options.process_as,
            output = %entry.options.output_workspace,
            "running reduction"
        );
        stage_inputs(entry, source, store)?;
        let inputs = ReductionInputs::from_store(store, &entry.inputs)?;
        let output = SansReduction::new(entry.options.clone()).execute(source, &inputs)?;
        for workspace in output.into_workspaces() {
            produced.push(workspace.name.clone());
            store.insert(workspace);
        }
    }
    Ok(produced)
}

fn stage_inputs<S: RunSource + ?Sized>(
    entry: &PlanEntry,
    source: &S,
    store: &mut WorkspaceStore,
) -> SansResult<()> {
    for (property, name) in entry.inputs.named() {
        if store.contains(name) {
            continue;
        }
        debug!(property, name, "loading auxiliary input");
        let mut workspace = source.load_run(name)?;
        workspace.name = name.to_string();
        store.insert(workspace);
    }
    Ok(())
}
