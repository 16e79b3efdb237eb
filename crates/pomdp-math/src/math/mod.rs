//! Core math modules.

pub mod simplex;
pub mod stable;
