use jiff::SignedDuration;
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};

#[serde_as]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolveStatistics {
    pub nodes_explored: usize,
    pub nodes_pruned: usize,
    pub lp_iterations: usize,
    pub incumbent_updates: usize,
    pub max_depth: usize,
    #[serde_as(as = "DisplayFromStr")]
    pub elapsed: SignedDuration,
}
