//! Operators on evaluated values and the access paths of assignment
//!
//! - [`binary`]: arithmetic, comparison and equality
//! - [`unary`]: negation and logical not
//! - [`access`]: index and property reads
//! - [`assign`]: plain and compound assignment to names, indices and properties

pub mod access;
pub mod assign;
pub mod binary;
pub mod unary;
