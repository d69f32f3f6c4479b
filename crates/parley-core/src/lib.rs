//! Types shared by every Parley crate

mod context;
mod error;

pub use context::RequestContext;
pub use error::HttpError;
