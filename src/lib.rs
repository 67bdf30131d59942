// lib.rs
#![warn(clippy::large_futures)]

pub use std::{pin::Pin, sync::Arc};

pub use tokio::{
    sync::RwLock,
    time::{sleep, Duration},
};
pub use tracing::*;

mod error;
pub use error::*;

mod layout;
pub use layout::*;

mod flags;
pub use flags::*;

mod text;
pub use text::*;

mod record;
pub use record::*;

mod validate;
pub use validate::*;

mod backing;
pub use backing::*;

#[cfg(target_os = "espidf")]
mod nvs;
#[cfg(target_os = "espidf")]
pub use nvs::*;

mod store;
pub use store::*;

mod config;
pub use config::*;

mod restart;
pub use restart::*;

mod state;
pub use state::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_TIME: &str = match option_env!("BUILD_TIMESTAMP") {
    Some(t) => t,
    None => "-",
};

// EOF
