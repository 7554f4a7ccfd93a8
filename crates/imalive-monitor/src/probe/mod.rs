//! Protocol probes
//!
//! Each probe makes a single attempt per cycle and reports every terminal
//! state as a [`crate::outcome::CheckOutcome`]; nothing here returns an error
//! or panics on a failing target.

pub mod http;
pub mod tcp;

pub use http::{sanitize_header_name, BasicAuth, HttpCheck, HttpMethod};
pub use tcp::TcpTarget;
