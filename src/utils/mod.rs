#![allow(missing_docs)]

pub mod config;
pub mod future_ext;
