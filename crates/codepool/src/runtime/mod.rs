mod sleep_provider;
#[cfg(feature = "tokio")]
mod tokio;

pub use sleep_provider::*;
#[cfg(feature = "tokio")]
pub use self::tokio::*;
