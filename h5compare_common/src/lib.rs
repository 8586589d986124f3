pub mod config;
pub mod container;
pub mod error;
pub mod record;
pub mod types;

pub use config::*;
pub use container::*;
pub use error::*;
pub use record::*;
pub use types::*;
