// src/lib.rs
pub mod config;
pub mod utils;
pub mod platform;
pub mod pipelines;
pub mod cli;
pub use cli::{Arguments, Command, CnvOp};
