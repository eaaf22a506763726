//! Application layer: selection, batching, dispatch, and the patch checker.

pub mod batch;
pub mod dispatch;
pub mod filters;
pub mod patches;
pub mod scan;
pub mod selection;
