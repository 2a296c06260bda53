//! Durability tiers for inputs
//!
//! Inputs are partitioned by how often they are expected to change. A
//! derived value that only read durable inputs can be confirmed valid
//! without walking its dependencies when only volatile inputs changed.

use std::fmt;

/// How often an input is expected to change, most volatile first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Durability {
    /// Re-sampled on every read (the current day)
    #[default]
    Volatile = 0,

    /// Changes on user interaction (filter criteria)
    Session = 1,

    /// Changes on explicit reload (catalog snapshot, engine policy)
    Durable = 2,

    /// Never changes
    Static = 3,
}

impl Durability {
    /// All tiers, most volatile first
    pub const ALL: [Durability; 4] = [
        Durability::Volatile,
        Durability::Session,
        Durability::Durable,
        Durability::Static,
    ];

    /// Position in [`Durability::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns true if this durability is at least as stable as `other`
    pub fn at_least(&self, other: Durability) -> bool {
        *self >= other
    }
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Durability::Volatile => write!(f, "volatile"),
            Durability::Session => write!(f, "session"),
            Durability::Durable => write!(f, "durable"),
            Durability::Static => write!(f, "static"),
        }
    }
}
