pub mod config;
pub mod local;
pub mod nicknames;
pub mod console;
pub mod service_handle;
pub mod cli;

pub use config::NodeConfig;
pub use service_handle::ServiceHandle;
pub use cli::run_cli;
