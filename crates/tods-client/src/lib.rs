//! Client side of the Tods simulation.
//!
//! A client polls its player's event feed, keeps a read-only mirror of the
//! ships it has been told about, and replays every action as a smooth
//! animation driven by its own [`Scheduler`](tods_core::Scheduler).
//!
//! # Modules
//!
//! - [`observer`] -- [`ObserverWorld`]: the mirror and animation bookkeeping
//! - [`animation`] -- Per-ship [`Animation`] state and its scheduler entry
//! - [`color`] -- Player colour assignment
//! - [`connector`] -- HTTP and in-process [`Connector`]s
//! - [`session`] -- [`ClientSession`]: poll/apply/render loop and commands
//! - [`error`] -- [`ClientError`]

pub mod animation;
pub mod color;
pub mod connector;
pub mod error;
pub mod observer;
pub mod session;

pub use animation::{Animation, AnimationDriver, AnimationState, AnimationTable};
pub use color::{Color, ColorTable, PALETTE};
pub use connector::{Connector, HttpConnector};
pub use error::ClientError;
pub use observer::{ObserverWorld, RENDER_TICK_MS, Sprite};
pub use session::{ClientSession, FrameReport};
