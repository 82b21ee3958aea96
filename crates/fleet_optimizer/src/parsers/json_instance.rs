use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::{
    json::types::JsonProblemInstance, parsers::parser::DatasetParser,
    problem::problem_instance::ProblemInstance,
};

/// Reads an instance file in the format of [`JsonProblemInstance`].
pub struct JsonInstanceParser;

impl DatasetParser for JsonInstanceParser {
    fn parse<P: AsRef<Path>>(&self, file: P) -> Result<ProblemInstance, anyhow::Error> {
        let path = file.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let instance =
            parse(&content).with_context(|| format!("invalid instance {}", path.display()))?;

        info!(
            file = %path.display(),
            nodes = instance.num_nodes(),
            periods = instance.num_periods(),
            vehicles = instance.fleet().num_vehicles(),
            "Instance loaded"
        );

        Ok(instance)
    }
}

pub fn parse(content: &str) -> Result<ProblemInstance, anyhow::Error> {
    let json: JsonProblemInstance = serde_json::from_str(content)?;
    json.build_instance()
}
