mod expirations;
mod health_check;
mod helpers;
mod servers;
