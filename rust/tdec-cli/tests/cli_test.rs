use tdec_cli::cli::{Cli, ChainCommand, Commands, TrackerCommand};

#[tokio::test]
async fn tracker_status_reports_nothing_tracked_for_a_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli {
        command: Commands::Tracker(TrackerCommand::Status { state_file: dir.path().join("does-not-exist.json") }),
        config: None,
    };
    tdec_cli::cli::run(cli).await.expect("missing state file must not be fatal");
}

#[tokio::test]
async fn chain_id_surfaces_a_transport_error_rather_than_panicking() {
    let cli = Cli {
        command: Commands::Chain(ChainCommand::ChainId { rpc_url: Some("http://127.0.0.1:1".to_string()) }),
        config: None,
    };
    let result = tdec_cli::cli::run(cli).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn tracker_status_lists_persisted_nonces_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("txs.json");
    std::fs::write(&state_file, r#"{"5": "0xaa", "2": "0xbb"}"#).unwrap();

    let cli = Cli {
        command: Commands::Tracker(TrackerCommand::Status { state_file }),
        config: None,
    };
    tdec_cli::cli::run(cli).await.expect("valid state file must load");
}
