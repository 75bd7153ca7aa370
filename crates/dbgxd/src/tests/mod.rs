//! Test suites for the dbgx host daemon.

mod support;
