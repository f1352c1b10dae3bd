//! Sprite Core - Foundational types for the sprite generation pipeline
//!
//! This crate provides the types every other sprite crate depends on:
//! - `SpriteError` - The error taxonomy shared by submission, polling and download
//! - `ContentHash` - SHA-256 hashing of downloaded artifacts
//! - `Result` alias

mod error;
mod hash;

pub use error::{Result, SpriteError};
pub use hash::ContentHash;
