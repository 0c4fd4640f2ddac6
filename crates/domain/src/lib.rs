#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod catalog;
mod error;
mod exercise;
mod filter;
mod muscle_target;
mod options;
mod prerequisite;
mod progression;
mod selection;
mod service;
mod settings;
mod taxonomy;
mod tracking;
mod user;

pub use catalog::*;
pub use error::*;
pub use exercise::*;
pub use filter::*;
pub use muscle_target::*;
pub use options::*;
pub use prerequisite::*;
pub use progression::*;
pub use selection::*;
pub use service::*;
pub use settings::*;
pub use taxonomy::*;
pub use tracking::*;
pub use user::*;
