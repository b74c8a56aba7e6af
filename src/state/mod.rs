//! State module for tracking what happened to each claimed resource
//!
//! Every resource popped from the frontier ends in exactly one
//! [`ResourceOutcome`]; the counts feed the end-of-run statistics.

mod outcome;

pub use outcome::ResourceOutcome;
