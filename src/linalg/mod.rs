//! Linear algebra module.
//!
//! Contains test harnesses for low level dense linear algebra routines.

pub mod evd;
