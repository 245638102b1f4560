//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! └── router.rs       - Main router creation
//! ```

/// Main router creation
pub mod router;

pub use router::create_router;
