mod health_check;
pub mod expirations;
pub mod servers;

pub use health_check::*;
