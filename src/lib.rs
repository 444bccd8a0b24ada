pub mod builtin;
pub mod cli;
pub mod errors;
pub mod eval;
pub mod global;
pub mod job;
pub mod logging;
pub mod parser;
pub mod redirect;
pub mod search;
pub mod types;

pub use eval::Control;
pub use global::Config;
pub use types::{CommandStep, Pipeline, RedirectMode, RedirectSpec, Sequence};
