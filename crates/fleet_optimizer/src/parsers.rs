pub mod json_instance;
pub mod parser;
pub mod place_geometry;
