pub mod adam;
pub mod log;
pub mod minimize;
