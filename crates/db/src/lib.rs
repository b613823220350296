pub mod connection;
pub mod models;

pub use connection::connect;
