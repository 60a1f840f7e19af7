pub mod clippy;
pub mod fmt;
