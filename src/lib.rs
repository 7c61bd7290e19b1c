#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::must_use_candidate,
    clippy::float_cmp,
    clippy::similar_names
)]

pub mod classification;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod observability;
pub mod pipeline;

pub use error::TrainerError;
