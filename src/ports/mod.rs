//! # Ports Module
//!
//! Interfaces between the search core and whatever drives it. The HTTP
//! handlers and the CLI depend on [`SearchServicePort`] only, never on the
//! concrete provider stack, which keeps them testable with stubs.

pub mod search_service;

pub use search_service::SearchServicePort;
