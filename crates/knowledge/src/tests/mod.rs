//! Engine-level tests against in-process fakes.

mod support;

mod conversation;
mod engine_state;
