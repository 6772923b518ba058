pub mod components;
pub mod config;
pub mod error;
pub mod shutdown;
pub mod startup;
pub mod utils;
pub mod web;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
