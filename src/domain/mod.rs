pub mod bar;
pub mod errors;
pub mod features;
pub mod metrics;
pub mod ports;
pub mod symbol;
