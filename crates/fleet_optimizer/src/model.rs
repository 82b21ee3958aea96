pub mod constraint;
pub mod expression;
pub mod milp_model;
pub mod variable;
