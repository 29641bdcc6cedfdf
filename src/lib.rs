//! Pxanim - Animated indexed-colour image editing core
//!
//! This library provides functionality to:
//! - Decode animated GIFs and composite their frames using disposal state
//! - Quantize true-colour frames to a shared 256-colour palette
//! - Export to animated GIF or to Aseprite archives with full RGBA cels

pub mod cli;
pub mod composite;
pub mod compress;
pub mod config;
pub mod container;
pub mod decode;
pub mod document;
pub mod export;
pub mod frames;
pub mod indexed;
pub mod palette;
pub mod tags;
