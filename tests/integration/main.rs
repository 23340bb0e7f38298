//! Workspace integration tests: surfaces, engine, store and broadcast
//! wired together in-process.

mod concurrency_test;
mod handshake_test;
mod helpers;
mod sync_test;
