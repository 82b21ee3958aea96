use std::path::{Path, PathBuf};

use clap::Subcommand;
use fleet_optimizer::{
    json::{schema::generate_json_schema, types::JsonProblemInstance},
    problem::generator::{GeneratorParams, generate_instance},
};
use tracing::info;

#[derive(Subcommand)]
pub enum GenerateSubcommands {
    /// JSON schema of the instance files
    JsonSchema {
        #[arg(long, short = 'o')]
        out: PathBuf,
    },
    /// Random instance around a central depot
    Instance {
        #[arg(long, short = 'c', default_value_t = 8)]
        customers: usize,

        #[arg(long, short = 'v', default_value_t = 2)]
        vehicles: usize,

        #[arg(long, short = 'p', default_value_t = 2)]
        periods: usize,

        #[arg(long, short = 's', default_value_t = 0)]
        seed: u64,

        /// Also generate battery capacity and energy coefficients
        #[arg(long)]
        energy: bool,

        #[arg(long, short = 'o')]
        out: PathBuf,
    },
}

fn write(out: &Path, content: String) -> Result<(), anyhow::Error> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(out, content)?;
    info!(file = %out.display(), "Written");

    Ok(())
}

pub fn run(subcommand: GenerateSubcommands) -> Result<(), anyhow::Error> {
    match subcommand {
        GenerateSubcommands::JsonSchema { out } => {
            write(&out, generate_json_schema()?)?;
        }
        GenerateSubcommands::Instance {
            customers,
            vehicles,
            periods,
            seed,
            energy,
            out,
        } => {
            let instance = generate_instance(&GeneratorParams {
                num_customers: customers,
                num_vehicles: vehicles,
                num_periods: periods,
                seed,
                with_energy: energy,
                ..GeneratorParams::default()
            })?;

            write(
                &out,
                serde_json::to_string_pretty(&JsonProblemInstance::from(&instance))?,
            )?;
        }
    }

    Ok(())
}
