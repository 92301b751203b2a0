pub mod anchor;
pub mod config;
pub mod gaps;
pub mod timeline;
