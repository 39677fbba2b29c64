mod database;
mod ports;
mod sessions;

pub use database::connect_and_migrate;
pub use ports::postgres_ports;
pub use sessions::build_postgres_session_layer;
