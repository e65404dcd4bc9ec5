//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - Document fixture builders (PDF via printpdf, DOCX via zip)
//! - Custom assertions over extracted text and reports
//! - The global MuPDF lock

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

use std::sync::{Mutex, MutexGuard};

// MuPDF has thread-safety issues with font loading, so PDF tests take this
// lock before touching a document.
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// Serializes MuPDF use across tests in one binary.
pub fn mupdf_guard() -> MutexGuard<'static, ()> {
    MUPDF_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
