pub mod schema;
pub mod token;
pub mod user;
