mod defaults;
pub mod loader;

pub use defaults::ClientConfig;
