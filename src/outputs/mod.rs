//! Digest rendering and delivery.
//!
//! # Submodules
//!
//! - [`digest`]: renders summaries into a subject, plain body and HTML body
//! - [`email`]: sends the rendered digest over SMTPS

pub mod digest;
pub mod email;
