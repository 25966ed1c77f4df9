//! Proxy facade and its builder

mod builder;
mod proxy;

pub use builder::{Hugin, HuginBuilder};
pub use proxy::{DEFAULT_SIGNAL_DAYS, IntelligenceProxy, MAX_SIGNAL_DAYS};
