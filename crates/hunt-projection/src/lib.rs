//! Live merged view of mob status and suppression state.
//!
//! The tracker keeps kill state in a few rank bucket documents and
//! suppression marks in one document per mob. This crate folds both over
//! the static catalog into one record per mob, keeps that record current
//! from the store's change stream, and computes the timer and suppression
//! view clients render.
//!
//! # Modules
//!
//! - [`projection`] -- Pure merge of change events into per-mob records
//! - [`store`] -- [`ProjectionStore`], the live projection and its
//!   subscriber channel
//! - [`view`] -- [`MobView`], spawn window and point state of one mob
//! - [`error`] -- Projection error type

pub mod error;
pub mod projection;
pub mod store;
pub mod view;

pub use error::ProjectionError;
pub use projection::{MobRecord, Projection};
pub use store::{ProjectionStore, ProjectionUpdate};
pub use view::MobView;
