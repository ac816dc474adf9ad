pub mod output;
pub mod predict;
pub mod validate;
