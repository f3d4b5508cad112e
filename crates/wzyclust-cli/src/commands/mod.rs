pub mod af3;
pub mod config;
pub mod merizo;
pub mod stats;
