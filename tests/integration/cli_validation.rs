//! Binary-level tests for argument validation

use assert_cmd::Command;

fn exporter() -> Command {
    let mut cmd = Command::cargo_bin("eth-tx-exporter").unwrap();
    cmd.env_remove("ETHERSCAN_API_KEY")
        .env_remove("ETHERSCAN_BASE_URL")
        .env("RUST_LOG", "eth_tx_exporter=error");
    cmd
}

#[test]
fn test_export_rejects_short_address() {
    // Unroutable base URL: a fetch would hang instead of failing fast
    exporter()
        .args(["export", "0x123", "--base-url", "http://10.255.255.1/api"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_validate_accepts_address() {
    let output = exporter()
        .args(["validate", "0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0xd8da6bf26964af9d7eed9e03e53415d37aa96045"));
}

#[test]
fn test_validate_rejects_address() {
    exporter()
        .args(["validate", "not-an-address"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_zero_rate_limit_is_usage_error() {
    exporter()
        .args([
            "export",
            "0xa39b189482f984388a34460636fea9eb181ad1a6",
            "--rate-limit",
            "0",
        ])
        .assert()
        .failure()
        .code(2);
}
