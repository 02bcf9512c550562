//! External authorization filter.
//!
//! Every protected request is first checked against an external authority
//! endpoint: a GET built from configurable header rules. A `200` lets the
//! request through (optionally with headers taken from the authority
//! response); anything else, including timeouts and transport errors, ends
//! it with `401 Unauthorized`.
//!
//! ```ignore
//! let filter = AuthDelegationFilter::from_directives(r#"
//!     endpoint http://127.0.0.1:8000/
//!     copy-request-header Authorization
//!     copy-response-header X-Token
//! "#)?;
//! ```
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod middleware;
pub mod state;

pub use filter::{AuthDelegationFilter, Decision, FilterConfig, Interceptor};
