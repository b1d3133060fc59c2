//! SQS worker for the sheetnest engine.
//!
//! Polls an input queue for nesting job descriptors, claims at most one job
//! at a time, drives extract → pack → export, persists the artifacts to S3
//! and reports the job's lifecycle to an output queue.

/// S3-backed artifact storage.
pub mod storage;

/// The polling worker and its queue message types.
pub mod worker;
