pub mod config;
pub mod logging;
pub mod matrix;
pub mod release;
pub mod version;
