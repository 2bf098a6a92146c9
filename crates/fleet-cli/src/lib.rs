//! Library half of the `fleet` command-line host.

pub mod import;
pub mod logging;
pub mod profile;
pub mod render;
pub mod settings;
pub mod sink;
pub mod table;
