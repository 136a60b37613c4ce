//! Scheduling core for the Tods hex-grid simulation.
//!
//! Both the authoritative server world and client observer worlds are
//! driven by the same primitive: a cooperative [`Scheduler`] that resumes
//! many small [`Logic`] state machines on a shared clock.
//!
//! # Modules
//!
//! - [`scheduler`] -- [`Scheduler`], [`Registrar`], and the [`Logic`]
//!   trait for resumable computations.
//! - [`config`] -- Configuration loading from `tods-config.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- Wall-clock ticker that drives a [`Tick`] target on its
//!   own cadence.
//!
//! [`Tick`]: runner::Tick

pub mod config;
pub mod runner;
pub mod scheduler;

pub use config::{ConfigError, TodsConfig};
pub use runner::{Tick, TickerControl, run_ticker};
pub use scheduler::{Logic, LogicError, Registrar, Scheduler, Step, TickReport, from_fn};
