#![allow(clippy::bool_comparison, clippy::enum_variant_names)]

pub mod application;
pub mod daemon;
pub mod enforcer;
pub mod routes;
pub mod suspension;

pub use lapse_shared::error_chain_fmt;
