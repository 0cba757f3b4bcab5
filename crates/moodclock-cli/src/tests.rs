use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["moodclock", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn seed_refreshes_by_default() {
    let cli = Cli::try_parse_from(["moodclock", "seed"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Seed { no_refresh: false }
    ));
}

#[test]
fn seed_accepts_no_refresh_flag() {
    let cli = Cli::try_parse_from(["moodclock", "seed", "--no-refresh"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Seed { no_refresh: true }));
}

#[test]
fn refresh_requires_country() {
    assert!(Cli::try_parse_from(["moodclock", "refresh"]).is_err());
}

#[test]
fn refresh_parses_window_and_dry_run() {
    let cli = Cli::try_parse_from([
        "moodclock",
        "refresh",
        "--country",
        "us",
        "--window-minutes",
        "60",
        "--dry-run",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Refresh {
            country,
            window_minutes,
            dry_run,
        } => {
            assert_eq!(country, "us");
            assert_eq!(window_minutes, Some(60));
            assert!(dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn refresh_rejects_zero_window() {
    let result = Cli::try_parse_from([
        "moodclock",
        "refresh",
        "--country",
        "US",
        "--window-minutes",
        "0",
    ]);
    assert!(result.is_err());
}

#[test]
fn refresh_all_window_defaults_to_config() {
    let cli = Cli::try_parse_from(["moodclock", "refresh-all"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::RefreshAll {
            window_minutes: None
        }
    ));
}

#[test]
fn status_accepts_optional_country() {
    let cli = Cli::try_parse_from(["moodclock", "status", "--country", "KE"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Status { country: Some(ref c) } if c == "KE"
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["moodclock"]).is_err());
}
