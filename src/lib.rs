pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod logging;
pub mod middleware;

pub use gate::{evaluate, Decision, GatePolicy, RouteTable};
