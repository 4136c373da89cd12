//! Shared callsign types for the Hamfurs bot.
//!
//! Everything in this crate is pure: canonicalization, jurisdiction
//! classification, flag emoji and Telegram Markdown helpers. Network and
//! storage concerns live in `hamfurs-bot`.

pub mod callsign;
pub mod classifier;
pub mod flags;
pub mod markdown;

pub use callsign::{Callsign, CallsignError};
pub use classifier::{ItuCountry, Jurisdiction, classify, fast_path, itu_country};
