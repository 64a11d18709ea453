//! Integration Tests Module
//!
//! End-to-end tests of the plan executor against mock tools: the reference
//! scenarios, scoring properties, retry/timeout/cancellation behavior, and
//! configuration loading.

// Shared mock tools and plan builders
mod fixtures;

// Reference scenarios (partial failure, scoring comparison, skips, no requirements)
mod scenario_test;


// Retries, timeouts, run deadline, cancellation, concurrency
mod resilience_test;
