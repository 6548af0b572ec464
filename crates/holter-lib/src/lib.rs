pub mod annotation;
pub mod config;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod selection;
pub mod session;
pub mod signal;
pub mod window;

pub use annotation::*;
pub use error::{Result, ReviewError};
pub use session::*;
pub use signal::*;
