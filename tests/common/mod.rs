//! Common test utilities for drive-gateway integration tests

use drive_gateway::config::DriveConfig;
use drive_gateway::{Config, DriveGateway};
use std::path::{Path, PathBuf};
use wiremock::MockServer;

/// Access token the mock Drive server expects
pub const TEST_TOKEN: &str = "test-access-token";

/// Drive settings pointing both base URLs at `server`
pub fn drive_config(server: &MockServer) -> DriveConfig {
    DriveConfig {
        api_base_url: format!("{}/drive/v3", server.uri()),
        upload_base_url: format!("{}/upload/drive/v3", server.uri()),
        ..DriveConfig::default()
    }
}

/// Gateway talking to the mock Drive server
#[allow(dead_code)]
pub fn gateway_for(server: &MockServer) -> DriveGateway {
    let config = Config {
        drive: drive_config(server),
        ..Config::default()
    };
    DriveGateway::connect(config, TEST_TOKEN).expect("gateway must start")
}

/// Write `contents` to `dir/name` and return the path
#[allow(dead_code)]
pub fn write_text_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}

/// Drive `files` resource JSON for a plain-text file
#[allow(dead_code)]
pub fn file_json(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": "drive#file",
        "id": id,
        "name": name,
        "mimeType": "text/plain",
        "parents": ["root"]
    })
}
