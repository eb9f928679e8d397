//! Binding generation tests
