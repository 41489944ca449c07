//! End-to-end route tests.
//!
//! Each test builds the full router over an in-memory SQLite catalog, the
//! real fixed-window rate limiter, and a scripted text-generation port, then
//! drives it with `tower::ServiceExt::oneshot`.

mod e2e_helpers;
