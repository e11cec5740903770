//! Tests for the phone auth session

mod session_tests;
