//! stockcast — next-day close forecasting for exchange-listed equities.
//!
//! The crate turns daily OHLCV bars into technical-indicator feature
//! matrices, slices them into fixed-length scaled sequences, and manages
//! the lifecycle of per-symbol regression models: train, evaluate,
//! persist, load, predict. The HTTP surface and batch scheduling live
//! outside this crate and call in through
//! [`application::service::ForecastService`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
