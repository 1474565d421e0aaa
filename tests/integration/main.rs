//! Integration tests for jobtide
//!
//! These tests use wiremock to serve listing pages and run the full
//! crawl-extract-save cycle against an on-disk database.

mod crawl_tests;
mod pagination_tests;
mod support;
