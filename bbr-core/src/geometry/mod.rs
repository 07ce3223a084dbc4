pub mod bbox;
pub mod r2;
