pub mod export;
pub mod persist;
pub mod settings;
pub mod snapshot;
