//! Writing extracted messages to disk.

pub mod eml;
