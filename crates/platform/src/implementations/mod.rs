//! Concrete `ProcessOperations` implementations

pub mod native;
