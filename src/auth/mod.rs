//! Login and logout flows.
//!
//! ARCHITECTURE
//! ============
//! A login gathers everything the session needs (primary credentials call,
//! then any dependent call) before committing one snapshot. Each attempt
//! takes a number from a monotonic sequence; only the latest attempt may
//! commit, so double submits and logins abandoned by navigating away cannot
//! overwrite a newer session.
//!
//! TRADE-OFFS
//! ==========
//! The sequence discards superseded responses instead of aborting their
//! HTTP requests. The requests still run to completion; their results are
//! simply dropped.

pub mod login;

pub use login::{LoginCoordinator, LoginOutcome};
