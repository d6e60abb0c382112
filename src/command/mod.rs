mod config;
mod resolve;
mod run;

pub use config::run_config;
pub use resolve::run_resolve;
pub use run::run_app;
