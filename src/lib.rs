//! Usage-statistics drawer injected into a host chat page.
//!
//! `core` holds the page model, data types and HTTP client; `overlay` holds
//! the widget components and the [`overlay::Overlay`] session that wires
//! them together.

pub mod core;
pub mod overlay;
