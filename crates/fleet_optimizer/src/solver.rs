pub mod branch_and_bound;
pub mod engine;
mod presolve;
mod simplex;
pub mod solve_error;
pub mod solve_params;
pub mod statistics;
