//! Core algorithms layer.
//!
//! Depends only on core. Used by the engine layer.
//!
//! # Contents
//!
//! - [`registration`]: Point cloud alignment (ICP)

pub mod registration;
