use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{model::constraint::Constraint, solver::solve_params::Threads};

pub mod big_m;
pub mod energy_model;
pub mod routing_model;

/// Builds every constraint of one family from a read-only context.
pub(crate) type ConstraintFamily<C> = fn(&C) -> Vec<Constraint>;

/// Builds the constraint families in parallel. Each family only reads `context` and
/// fills its own vector, the families are concatenated in declaration order so the
/// model is identical whatever the number of threads.
pub(crate) fn build_constraint_families<C: Sync>(
    context: &C,
    families: &[(&'static str, ConstraintFamily<C>)],
    threads: &Threads,
) -> Vec<Constraint> {
    let build = || {
        families
            .par_iter()
            .map(|(name, family)| {
                let constraints = family(context);
                debug!(family = name, constraints = constraints.len(), "Constraint family built");
                constraints
            })
            .collect::<Vec<_>>()
    };

    let built = match threads {
        Threads::Auto => build(),
        _ => match rayon::ThreadPoolBuilder::new()
            .num_threads(threads.number_of_threads())
            .build()
        {
            Ok(pool) => pool.install(build),
            Err(error) => {
                warn!(%error, "Failed to create the model thread pool, using the global pool");
                build()
            }
        },
    };

    built.into_iter().flatten().collect()
}
