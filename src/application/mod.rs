pub mod forest;
pub mod indicators;
pub mod predictor;
pub mod regressor;
pub mod scaling;
pub mod sequences;
pub mod service;
pub mod trainer;
