//! Language host: feeds tracked files to an analysis engine, expands import
//! closures and answers queries against the engine's current view

pub mod host;
pub mod reassembly;
pub mod closure;
pub mod queries;


pub use host::{LanguageHost, LanguageHostBuilder, AddFileOptions, GetFileOptions};
