pub mod energy;
pub mod fleet;
pub mod generator;
pub mod node;
pub mod periods;
pub mod problem_instance;
pub mod time_window;
pub mod travel_matrices;
pub mod validation;
