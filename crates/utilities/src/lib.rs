#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

#[macro_use]
mod cast_macro;

mod debug_trace;
mod error;
mod test_logger;

pub use error::*;
pub use random_test::*;
pub use test_logger::*;
