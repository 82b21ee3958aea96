use std::{fs::File, io::BufWriter, path::PathBuf, time::Duration};

use anyhow::bail;
use clap::{Args, ValueEnum};
use fleet_optimizer::{
    extraction::checker::Violation,
    optimizer::{OptimizeParams, Optimizer},
    parsers::{json_instance::JsonInstanceParser, parser::DatasetParser, place_geometry},
    problem::problem_instance::ProblemInstance,
    solver::solve_params::{SolveParams, Termination, Threads},
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::{parsers, report};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModelKind {
    /// Time-indexed routing with time windows, minimizes travel time
    Routing,
    /// Battery constrained fleet, minimizes the fleet cost
    Energy,
}

#[derive(Args)]
pub struct OptimizeArgs {
    /// Instance file
    #[arg(short = 'i', long)]
    input: PathBuf,

    #[arg(short, long, value_enum, default_value_t = ModelKind::Routing)]
    model: ModelKind,

    /// Time limit of the solver (e.g., "30s", "5m", "PT1H30M")
    #[arg(short, long, env = "FLEET_TIMEOUT", value_parser = parsers::parse_duration, default_value = "60s")]
    timeout: jiff::SignedDuration,

    /// Maximum number of branch-and-bound nodes
    #[arg(short, long, env = "FLEET_NODE_LIMIT")]
    nodes: Option<usize>,

    /// Threads used to build the model, all available cores when omitted
    #[arg(long)]
    threads: Option<usize>,

    /// Place coordinates, one `{'lat': .., 'lng': ..}` record per node
    #[arg(long)]
    geometry: Option<PathBuf>,

    /// Writes the solution as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Checks the solution against the instance
    #[arg(long)]
    verify: bool,

    /// Fails when optimality is not proven
    #[arg(long)]
    strict: bool,
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn check(violations: Vec<Violation>) -> Result<(), anyhow::Error> {
    if violations.is_empty() {
        info!("Solution verified");
        return Ok(());
    }

    for violation in violations.iter() {
        warn!(%violation, "Violation");
    }
    bail!("the solution violates {} constraint(s)", violations.len())
}

fn write_output<T: Serialize>(output: Option<PathBuf>, solution: &T) -> Result<(), anyhow::Error> {
    if let Some(output) = output {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        serde_json::to_writer_pretty(BufWriter::new(File::create(&output)?), solution)?;
        info!(file = %output.display(), "Solution written");
    }

    Ok(())
}

fn load_instance(args: &OptimizeArgs) -> Result<ProblemInstance, anyhow::Error> {
    let mut instance = JsonInstanceParser.parse(&args.input)?;

    if let Some(geometry) = &args.geometry {
        let coordinates = place_geometry::parse_file(geometry)?;
        instance.attach_coordinates(&coordinates);
    }

    Ok(instance)
}

pub fn run(args: OptimizeArgs) -> Result<(), anyhow::Error> {
    let instance = load_instance(&args)?;

    let mut terminations = vec![Termination::Duration(args.timeout)];
    if let Some(nodes) = args.nodes {
        terminations.push(Termination::Nodes(nodes));
    }

    let optimizer = Optimizer::new(OptimizeParams {
        solve: SolveParams::with_terminations(terminations),
        accept_incumbent: !args.strict,
        threads: args.threads.map_or(Threads::Auto, Threads::Multi),
        ..OptimizeParams::default()
    });

    match args.model {
        ModelKind::Routing => {
            let bar = spinner("Solving the routing model");
            let result = optimizer.solve_routing(&instance);
            bar.finish_and_clear();
            let solution = result?;

            println!("{}", report::routing_table(&instance, &solution));
            info!(
                status = ?solution.status(),
                travel_time = solution.objective(),
                handling_time = solution.handling_time(),
                total_time = solution.total_time(),
                nodes = solution.statistics().nodes_explored,
                elapsed = %solution.statistics().elapsed,
                "Routing solution"
            );

            if args.verify {
                check(solution.verify(&instance))?;
            }
            write_output(args.output, &solution)?;
        }
        ModelKind::Energy => {
            let bar = spinner("Solving the energy model");
            let result = optimizer.solve_energy(&instance);
            bar.finish_and_clear();
            let solution = result?;

            println!("{}", report::energy_table(&instance, &solution));
            let costs = solution.costs();
            info!(
                status = ?solution.status(),
                objective = solution.objective(),
                fixed = costs.fixed,
                distance = costs.distance,
                energy = costs.energy,
                unused_vehicles = ?solution.unused_vehicles(),
                nodes = solution.statistics().nodes_explored,
                elapsed = %solution.statistics().elapsed,
                "Energy solution"
            );

            if args.verify {
                check(solution.verify(&instance))?;
            }
            write_output(args.output, &solution)?;
        }
    }

    Ok(())
}
