use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(VarId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    name: String,
    kind: VarKind,
    lower: f64,
    upper: f64,
}

impl Variable {
    pub fn binary(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
        }
    }

    pub fn integer(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Variable {
            name: name.into(),
            kind: VarKind::Integer,
            lower,
            upper,
        }
    }

    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Variable {
            name: name.into(),
            kind: VarKind::Continuous,
            lower,
            upper,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VarKind {
        self.kind
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_integral(&self) -> bool {
        matches!(self.kind, VarKind::Binary | VarKind::Integer)
    }
}
