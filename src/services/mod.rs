pub mod loader;
pub mod report;
