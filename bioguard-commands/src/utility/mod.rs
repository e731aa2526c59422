pub mod broadcast;
pub mod help;
pub mod start;
