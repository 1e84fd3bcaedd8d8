use super::*;

#[test]
fn test_ls_accepts_signed_layer_ids() {
    let cli = Cli::try_parse_from(["layer", "ls", "alpine", "-1", "+2", "3"]).unwrap();

    match cli.command {
        Commands::Ls { layers, sort, .. } => {
            assert_eq!(layers, ["-1", "+2", "3"]);
            assert!(!sort);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_ls_sort_flag_alongside_layer_ids() {
    let cli = Cli::try_parse_from(["layer", "ls", "alpine", "-S", "2", "-1"]).unwrap();

    match cli.command {
        Commands::Ls { layers, sort, .. } => {
            assert_eq!(layers, ["2", "-1"]);
            assert!(sort);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_info_is_an_alias_for_inspect() {
    let cli = Cli::try_parse_from(["layer", "info", "alpine", "--format", "json"]).unwrap();

    assert_eq!(cli.command.name(), "inspect");
}

#[tokio::test]
async fn test_negative_layer_id_is_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = commands::testutil::saved_image(dir.path(), &[("a", 1)]);
    let mut config = liblayer::Config::default();
    config.daemon.enabled = false;
    let ctx = context::AppContext {
        config,
        verbosity: context::VerbosityLevel::Quiet,
    };

    let err = commands::ls::handle_ls(
        &ctx,
        &path.to_string_lossy(),
        &["-1".to_string()],
        false,
        format::OutputFormat::Pretty,
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "layer -1 does not exist");
}
