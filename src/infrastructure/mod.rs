pub mod mock;
pub mod registry;
pub mod yahoo;
