#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless Dice Roll sessions driven by a seeded autoplayer.

pub mod config;
pub mod session;

pub use config::FileConfig;
pub use session::{Session, Summary};
