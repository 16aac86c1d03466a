pub mod auth;
pub mod extract;
pub mod garages;
pub mod health;
pub mod profile;
pub mod requests;
pub mod vehicles;
