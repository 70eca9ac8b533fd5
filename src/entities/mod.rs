pub mod prelude;

pub mod addresses;
pub mod tokens;
pub mod users;
