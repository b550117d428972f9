//! Pipeline steps, one module per portal section.

pub mod basic;
pub mod detail;
pub mod dialog;
pub mod login;
pub mod payment;
pub mod save;
pub mod upload;
