pub mod pages;
pub mod public;
pub mod session;
