pub mod address;
pub mod token;
pub mod user;
