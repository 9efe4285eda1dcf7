//! End-to-end lifecycle tests: the engine wired to in-memory fakes, driven
//! through the same operations the HTTP handlers call.

mod support;
mod test_billing;
mod test_publication;
mod test_transitions;
