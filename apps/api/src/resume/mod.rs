// Resume intake: validation, transient storage, retention and the HTTP handlers
// tying them to document analysis.

pub mod handlers;
pub mod models;
pub mod retention;
pub mod storage;
pub mod validation;
