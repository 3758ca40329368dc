//! Pulse - live health monitor for the master and tenant services
//!
//! This library provides the connection manager that keeps one live source of
//! health data per service (server-sent event stream with heartbeat watchdog,
//! or fixed-interval polling), and the status store it feeds with
//! connectivity, latency and a bounded latency history.

pub mod cli;
pub mod config;
pub mod health;
pub mod logging;
pub mod monitor;
pub mod status;
