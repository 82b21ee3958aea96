pub mod builders;
pub mod error;
pub mod extraction;
pub mod model;
pub mod optimizer;
pub mod parsers;
pub mod problem;
pub mod solver;
mod utils;

pub mod json;

#[cfg(test)]
pub(crate) mod test_utils;
