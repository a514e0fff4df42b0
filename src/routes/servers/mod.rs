pub mod get;
pub mod list;
pub mod resources;
pub mod suspension;
pub mod update_expiration;

pub use get::get;
pub use list::list;
pub use resources::resources;
pub use suspension::suspension;
pub use update_expiration::update_expiration;
