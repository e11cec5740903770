//! Tests for the Identity Toolkit adapter
