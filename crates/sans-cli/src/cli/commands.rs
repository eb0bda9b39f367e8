use super::CliError;
use anyhow::Context;
use sans_core::common::config::{
    DEFAULT_BEAM_RADIUS, DEFAULT_SAMPLE_THICKNESS, DEFAULT_WATER_CROSS_SECTION,
    InputWorkspaceNames, PlanEntry, ReductionOptions, ReductionPlan,
};
use sans_core::domain::{NormaliseBy, ProcessType};
use sans_core::modules::serialization::write_workspace_to_dir;
use sans_core::modules::{JsonRunSource, plan_for, run_plan};
use sans_core::workspace::WorkspaceStore;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(clap::Args)]
pub(super) struct ReduceArgs {
    /// Process type of the measurement
    #[arg(long = "process", default_value = "Sample")]
    process_as: ProcessType,

    /// Comma separated runs; `+` sums runs, 000000 marks a missing sample
    #[arg(long)]
    runs: String,

    /// Name of the reduced workspace
    #[arg(long = "output")]
    output_workspace: String,

    /// Directory holding run and auxiliary workspace files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory receiving `<name>.json` for every produced workspace
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, default_value = "Monitor")]
    normalise_by: NormaliseBy,

    /// Beam radius [m]
    #[arg(long, default_value_t = DEFAULT_BEAM_RADIUS)]
    beam_radius: f64,

    /// Sample thickness [cm], one value or one per sample; -1 reads the run logs
    #[arg(long = "thickness", value_delimiter = ',', allow_negative_numbers = true, default_values_t = [DEFAULT_SAMPLE_THICKNESS])]
    sample_thickness: Vec<f64>,

    /// Water cross-section [cm-1]
    #[arg(long, default_value_t = DEFAULT_WATER_CROSS_SECTION)]
    water_cross_section: f64,

    /// Use the scattering angle dependent transmission correction
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    transmission_theta_dependent: bool,

    /// Name of the incident flux output
    #[arg(long)]
    flux_output: Option<String>,

    /// Name of the sensitivity output
    #[arg(long)]
    sensitivity_output: Option<String>,

    #[command(flatten)]
    inputs: InputArgs,
}

/// Auxiliary workspaces, by file name relative to the data directory.
#[derive(clap::Args)]
pub(super) struct InputArgs {
    #[arg(long)]
    dark_current: Option<String>,
    #[arg(long)]
    empty_beam: Option<String>,
    #[arg(long)]
    transmission: Option<String>,
    #[arg(long)]
    empty_container: Option<String>,
    #[arg(long)]
    flat_field: Option<String>,
    #[arg(long)]
    solvent: Option<String>,
    #[arg(long)]
    default_mask: Option<String>,
    #[arg(long)]
    mask: Option<String>,
}

impl From<InputArgs> for InputWorkspaceNames {
    fn from(args: InputArgs) -> Self {
        Self {
            dark_current_workspace: args.dark_current,
            empty_beam_workspace: args.empty_beam,
            transmission_workspace: args.transmission,
            empty_container_workspace: args.empty_container,
            flat_field_workspace: args.flat_field,
            solvent_workspace: args.solvent,
            default_mask_workspace: args.default_mask,
            mask_workspace: args.mask,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct ChainArgs {
    /// Reduction plan (JSON)
    #[arg(long)]
    plan: PathBuf,

    /// Directory holding run and auxiliary workspace files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory receiving `<name>.json` for every produced workspace
    #[arg(long)]
    output_dir: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct PlanArgs {
    #[arg(long = "process")]
    process_as: ProcessType,

    /// Print the steps as a JSON array
    #[arg(long)]
    json: bool,
}

pub(super) fn run_reduce_command(args: ReduceArgs) -> Result<i32, CliError> {
    let options = ReductionOptions {
        runs: args.runs,
        process_as: args.process_as,
        output_workspace: args.output_workspace,
        normalise_by: args.normalise_by,
        beam_radius: args.beam_radius,
        sample_thickness: args.sample_thickness,
        water_cross_section: args.water_cross_section,
        transmission_theta_dependent: args.transmission_theta_dependent,
        output_flux_workspace: args.flux_output,
        output_sensitivity_workspace: args.sensitivity_output,
    };
    let plan = ReductionPlan {
        reductions: vec![PlanEntry {
            options,
            inputs: args.inputs.into(),
        }],
    };
    execute_plan(&plan, &args.data_dir, &args.output_dir)
}

pub(super) fn run_chain_command(args: ChainArgs) -> Result<i32, CliError> {
    let plan = ReductionPlan::from_path(&args.plan).map_err(CliError::Compute)?;
    execute_plan(&plan, &args.data_dir, &args.output_dir)
}

pub(super) fn run_plan_command(args: PlanArgs) -> Result<i32, CliError> {
    let steps = plan_for(args.process_as);
    if args.json {
        let rendered = serde_json::to_string(&steps)
            .context("failed to encode the correction steps as JSON")?;
        println!("{}", rendered);
    } else {
        for step in steps {
            println!("{}", step);
        }
    }
    Ok(0)
}

fn execute_plan(plan: &ReductionPlan, data_dir: &Path, output_dir: &Path) -> Result<i32, CliError> {
    let source = JsonRunSource::new(data_dir);
    let mut store = WorkspaceStore::new();
    let produced = run_plan(plan, &source, &mut store).map_err(CliError::Compute)?;
    for name in produced {
        let workspace = store
            .get(&name)
            .with_context(|| format!("produced workspace '{}' is missing from the store", name))?;
        let path = write_workspace_to_dir(output_dir, workspace).map_err(CliError::Compute)?;
        info!(workspace = %name, path = %path.display(), "wrote workspace");
        println!("{}", path.display());
    }
    Ok(0)
}
