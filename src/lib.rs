// memogate - AI provider proxy gateway

pub mod api;
pub mod config;
pub mod error;
