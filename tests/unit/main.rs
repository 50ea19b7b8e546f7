//! Unit test suite entry point.

mod bash_classify_tests;
mod cluster_tests;
mod session_mining_tests;
