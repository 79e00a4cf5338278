#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod attachments;
mod builder;
mod error;
mod random_term;
mod term;
mod transformer;
mod visitor;

pub use attachments::*;
pub use builder::*;
pub use error::*;
pub use random_term::*;
pub use term::*;
pub use transformer::*;
pub use visitor::*;
