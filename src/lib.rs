//! `spamextract`: recover the original message from spam filter reports.
//!
//! A spam report wraps the suspected message as a `message/rfc822` part.
//! This crate finds that part, rewrites its `Message-ID` and writes it out
//! as a standalone `.eml` file, either for a single file or for every
//! report moved into a watched maildir folder.

pub mod config;
pub mod deliver;
pub mod error;
pub mod export;
pub mod parser;
pub mod processor;
pub mod watch;
