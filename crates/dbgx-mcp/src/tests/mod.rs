//! Behavioural tests for the MCP endpoint.
