//! Real-time service scoring.
//!
//! Headway estimation for groups of same-route vehicles, schedule adherence
//! for lone vehicles, and the letter grades derived from both.

pub mod adherence;
pub mod grade;
pub mod headway;
pub mod interpolator;
pub mod scorer;
pub mod utility;
