//! Unit tests - cross-module checks that need no server
//!
//! Statement compilation and row decoding are exercised together here: the
//! row schema a graph statement is compiled with must decode rows shaped by
//! that statement's RETURN list.

mod graph_schema_tests;
mod injection_safety_tests;
