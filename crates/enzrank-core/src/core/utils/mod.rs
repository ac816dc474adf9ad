//! Numerical helpers shared by the core models and the engine.

pub mod geometry;
