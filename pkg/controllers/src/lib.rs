//! Background controllers.
//!
//! The lifecycle scheduler owns every deployment record from the moment its
//! manifest is submitted until its objects are confirmed gone.

pub mod lifecycle;
