//! Shared test utilities.

#![allow(dead_code)]

pub mod mock_backend;

use obra_data::config::{Config, DataMode, MockMode};
use std::time::Duration;
use tokio::sync::watch;

/// Mock-mode config without latency or minimum loading time.
pub fn mock_config(mode: MockMode) -> Config {
    let mut config = Config::default();
    config.data_mode = DataMode::Mock;
    config.mock.mode = mode;
    config.mock.delay = false;
    config.ui.min_loading_ms = 0;
    config
}

pub fn api_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.data_mode = DataMode::Api;
    config.api.base_url = base_url.to_string();
    config.api.timeout_ms = 2_000;
    config.ui.min_loading_ms = 0;
    config
}

/// Waits until the watched state satisfies `predicate`, failing the test after two seconds.
pub async fn wait_until<T>(rx: &mut watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
}
