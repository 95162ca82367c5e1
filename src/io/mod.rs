//! I/O utilities for stream handling
//!
//! This module provides traits and implementations for the random-access
//! reads and the append/patch writes the page rewriter relies on.

pub mod seekable;
pub mod byte_order;
