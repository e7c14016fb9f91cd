pub mod data;
pub mod defaults;
pub mod env;
pub mod io;

pub use data::Config;
pub use io::ConfigError;

#[cfg(test)]
pub mod tests;
