//! Integration tests - drive the public `Adapter` end to end
//!
//! A scripted in-memory transport stands in for the server: it serves the
//! discovery document, answers Cypher POSTs from a queue of canned bodies and
//! records every request for assertions.

mod adapter_flow_tests;
mod registry_tests;
