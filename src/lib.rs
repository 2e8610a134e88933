//! # crib-portal
//!
//! Client core for the CRIB credit-bureau portals (Bank, CRIB member,
//! Customer). Holds the persisted session, decides which role-scoped views
//! the current principal may open, and talks to the REST backend.
//!
//! The crate is UI-agnostic: a front end (or the bundled `crib-portal` CLI)
//! drives everything through a [`portal::Portal`] context object.

pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod nav;
pub mod portal;
pub mod session;

#[cfg(test)]
mod test_support;
