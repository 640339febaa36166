pub mod core;
pub mod quiz;
pub mod results;
pub mod student;
pub mod study;
