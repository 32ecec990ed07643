//! Yahoo Finance provider implementation

pub mod crumb;
pub mod payload;
pub mod yahoo;

pub use crumb::CrumbSession;
pub use yahoo::YahooProvider;
