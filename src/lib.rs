//! Grade statistics for school reporting.
//!
//! Score records are grouped per entity (student, class or subject), rescaled
//! onto the 0-20 scale, summarised and ranked by mean.

pub mod aggregate;
pub mod db;
pub mod error;
pub mod models;
pub mod report;
pub mod source;
