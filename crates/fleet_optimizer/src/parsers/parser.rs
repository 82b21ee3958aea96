use std::path::Path;

use crate::problem::problem_instance::ProblemInstance;

pub trait DatasetParser {
    fn parse<P: AsRef<Path>>(&self, file: P) -> Result<ProblemInstance, anyhow::Error>;
}
