//! Test suites for the hakit daemon.

pub(crate) mod support;
