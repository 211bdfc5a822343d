pub mod analyze;
pub mod check;
pub mod suggest;
