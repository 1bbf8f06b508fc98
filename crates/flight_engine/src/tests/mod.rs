//! Cross-module tests that run the whole frame pipeline

mod corridor_flight;
