//! core
//!
//! Domain types shared by every layer.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId, BranchName, ResetMode, ConflictSide
//! - [`value`] - Attribute value codec and type tags
//! - [`wkt`] - WKT tokenizing and canonical form
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod types;
pub mod value;
pub mod wkt;
