mod get;
mod list;
mod resources;
mod suspension;
mod update_expiration;
