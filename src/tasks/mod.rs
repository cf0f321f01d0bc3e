pub mod runner;
pub mod scheduler;
