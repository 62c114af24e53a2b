//! Processing stages shared by the image and barcode runs.
//!
//! Image mode flows through the stages left to right:
//!
//! ```text
//! share link ──▶ extract ──▶ fetch (browser + poll) ──▶ naming ──▶ compose
//! ```
//!
//! Barcode mode uses only `naming` and `barcode`. Each stage is independently
//! testable; orchestration lives in [`crate::run`].

pub mod barcode;
pub mod compose;
pub mod extract;
pub mod fetch;
pub mod naming;
pub mod poll;
