//! Statistical routines.

pub mod roc;
