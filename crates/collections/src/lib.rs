#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod disjoint_forest;
mod disjoint_map;
mod disjoint_set;
mod vecset;

pub use disjoint_forest::DisjointClass;
pub use disjoint_map::*;
pub use disjoint_set::*;
pub use vecset::*;
