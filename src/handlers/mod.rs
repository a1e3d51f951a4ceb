pub mod auth;
pub mod driver;
pub mod passenger;
pub mod rides;
