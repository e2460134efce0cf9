//! Low-level data structures backing the indexes

pub mod int_set;

pub use int_set::{AdaptiveIntSet, Representation};
