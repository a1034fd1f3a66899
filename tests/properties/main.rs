//! Property-based tests.

mod invariant_tests;
