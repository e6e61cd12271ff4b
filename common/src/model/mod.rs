pub mod roster;
pub mod scan;
