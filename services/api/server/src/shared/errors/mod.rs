pub mod base;
pub mod common;

pub use base::{ApiError, codes};
pub use common::*;
