//! TTB Label Compliance Verification
//!
//! Verifies that beverage label images carry the statements required by
//! 27 CFR Parts 4, 5, 7 and 16. A vision model extracts the label fields
//! (with one targeted retry when fields come back unreadable), deterministic
//! per-category rules check them, and batches of labels are verified
//! concurrently with per-label progress streamed as each one finishes.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
