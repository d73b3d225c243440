//! Shared test utilities for smbridge core integration tests.
//!
//! Every test runs against an in-memory share server, so no network or
//! containers are needed.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use smbridge_core::client::memory::MemoryShareClient;
use smbridge_core::config::SmbConfig;
use smbridge_core::files::SmbFileOperations;

pub const HOST: &str = "fileserver";
pub const SHARE: &str = "exchange";
pub const USERNAME: &str = "svc-pipeline";
pub const PASSWORD: &str = "testpass";
pub const DOMAIN: &str = "CORP";

/// A server with the test share and the test user registered.
pub fn server() -> MemoryShareClient {
    let client = MemoryShareClient::new(HOST);
    client.add_user(USERNAME, PASSWORD);
    client.add_share(SHARE);
    client
}

/// Settings JSON as a pipeline would hand it over.
pub fn settings() -> serde_json::Value {
    serde_json::json!({
        "host": HOST,
        "share": SHARE,
        "username": USERNAME,
        "password": PASSWORD,
        "domain": DOMAIN
    })
}

pub fn endpoint() -> SmbConfig {
    SmbConfig::from_settings(settings()).expect("test settings should parse")
}

/// An adapter pointed at [`endpoint()`] on `server`.
pub fn operations(server: &MemoryShareClient) -> SmbFileOperations {
    SmbFileOperations::with_endpoint(server.clone(), endpoint())
        .expect("test endpoint should be valid")
}

/// Deterministic non-repeating-looking test data.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 256) as u8).collect()
}
