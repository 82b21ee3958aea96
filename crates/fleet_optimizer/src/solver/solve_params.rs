use jiff::SignedDuration;

/// Budget of a solve, the first one reached stops the search.
#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    Duration(SignedDuration),
    Nodes(usize),
}

#[derive(Clone, Debug)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SolveParams {
    pub terminations: Vec<Termination>,
    /// A value within this distance of an integer counts as integral.
    pub integrality_tolerance: f64,
    /// Nodes whose relaxation cannot improve the incumbent by more than this are pruned.
    pub absolute_gap: f64,
}

impl Default for SolveParams {
    fn default() -> Self {
        SolveParams {
            terminations: vec![Termination::Duration(SignedDuration::from_secs(60))],
            integrality_tolerance: 1e-6,
            absolute_gap: 1e-6,
        }
    }
}

impl SolveParams {
    pub fn with_terminations(terminations: Vec<Termination>) -> Self {
        SolveParams {
            terminations,
            ..SolveParams::default()
        }
    }

    pub fn time_limit(&self) -> Option<SignedDuration> {
        self.terminations
            .iter()
            .filter_map(|termination| match termination {
                Termination::Duration(duration) => Some(*duration),
                Termination::Nodes(_) => None,
            })
            .min()
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.terminations
            .iter()
            .filter_map(|termination| match termination {
                Termination::Nodes(nodes) => Some(*nodes),
                Termination::Duration(_) => None,
            })
            .min()
    }
}
