#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod empty;
mod engine;
mod error;
mod persistent;
mod singleton;
mod substitution;
mod unifier;
mod union_find;

pub use empty::*;
pub use error::*;
pub use persistent::*;
pub use singleton::*;
pub use substitution::EquivalenceClass;
pub use substitution::Substitution;
pub use unifier::*;
pub use union_find::UnionFindSubstitution;
