use chrono::NaiveDate;
use clap::Parser;
use fttm_core::{brands::parse_brands, AppConfig, DatePreset, Environment, MetricKind};
use fttm_import::Strategy;

use super::{dashboard_state, Cli, Commands, DbCommands, EntryCommands, Runtime};
use crate::login::tests::{admin_table, config};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn parses_db_ping() {
    let cli = Cli::try_parse_from(["fttm-cli", "db", "ping"]).expect("db ping should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate() {
    let cli = Cli::try_parse_from(["fttm-cli", "db", "migrate"]).expect("db migrate should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_import_with_strategy_and_dry_run() {
    let cli = Cli::try_parse_from([
        "fttm-cli",
        "import",
        "ads",
        "uploads/ads.csv",
        "--on-duplicate",
        "keep-existing",
        "--dry-run",
    ])
    .expect("import should parse");

    match cli.command {
        Some(Commands::Import {
            kind,
            file,
            on_duplicate,
            dry_run,
        }) => {
            assert_eq!(kind, MetricKind::Ads);
            assert_eq!(file.to_str(), Some("uploads/ads.csv"));
            assert_eq!(on_duplicate, Some(Strategy::KeepExisting));
            assert!(dry_run);
        }
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn import_rejects_unknown_kind() {
    let result = Cli::try_parse_from(["fttm-cli", "import", "weather", "x.csv"]);
    assert!(result.is_err());
}

#[test]
fn import_rejects_unknown_strategy() {
    let result = Cli::try_parse_from([
        "fttm-cli",
        "import",
        "ads",
        "x.csv",
        "--on-duplicate",
        "merge",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_entry_postings() {
    let cli = Cli::try_parse_from([
        "fttm-cli",
        "--user",
        "admin",
        "entry",
        "postings",
        "--brand",
        "FindHouse",
        "--date",
        "2024-01-01",
        "--sale",
        "30",
        "--rent",
        "20",
        "--auction",
        "10",
    ])
    .expect("entry postings should parse");

    assert_eq!(cli.user.as_deref(), Some("admin"));
    match cli.command {
        Some(Commands::Entry {
            command:
                EntryCommands::Postings {
                    brand,
                    date,
                    sale,
                    rent,
                    auction,
                },
        }) => {
            assert_eq!(brand, "FindHouse");
            assert_eq!(date, Some(d("2024-01-01")));
            assert_eq!((sale, rent, auction), (30, 20, 10));
        }
        other => panic!("expected entry postings, got {other:?}"),
    }
}

#[test]
fn entry_traffic_dates_are_optional() {
    let cli = Cli::try_parse_from([
        "fttm-cli",
        "entry",
        "traffic",
        "--brand",
        "FindHouse",
        "--users",
        "1200",
    ])
    .expect("entry traffic should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Entry {
            command: EntryCommands::Traffic {
                start: None,
                end: None,
                users: 1200,
                ..
            }
        })
    ));
}

#[test]
fn parses_overview_defaults() {
    let cli = Cli::try_parse_from(["fttm-cli", "overview"]).expect("overview should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Overview {
            kind: None,
            limit: 20,
            json: false
        })
    ));
}

#[test]
fn parses_template_kind() {
    let cli = Cli::try_parse_from(["fttm-cli", "template", "rank"]).expect("template should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Template {
            kind: MetricKind::Rank
        })
    ));
}

#[test]
fn parses_dashboard_preset_and_brands() {
    let cli = Cli::try_parse_from([
        "fttm-cli",
        "dashboard",
        "--preset",
        "ytd",
        "--brand",
        "FindHouse",
        "--brand",
        "CheckValue",
    ])
    .expect("dashboard should parse");

    match cli.command {
        Some(Commands::Dashboard { preset, brands, .. }) => {
            assert_eq!(preset, Some(DatePreset::YearToDate));
            assert_eq!(brands, vec!["FindHouse", "CheckValue"]);
        }
        other => panic!("expected dashboard, got {other:?}"),
    }
}

#[test]
fn dashboard_preset_conflicts_with_explicit_dates() {
    let result = Cli::try_parse_from([
        "fttm-cli",
        "dashboard",
        "--preset",
        "7d",
        "--from",
        "2024-01-01",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_summary_default_latest() {
    let cli = Cli::try_parse_from(["fttm-cli", "summary"]).expect("summary should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Summary { latest: 4 })
    ));
}

#[test]
fn dashboard_state_defaults_to_all_brands() {
    let brands = parse_brands("brands:\n  - name: FindHouse\n  - name: CheckValue\n").unwrap();
    let state = dashboard_state(&brands, d("2024-06-30"), None, None, None, Vec::new()).unwrap();

    assert_eq!(state.brands, vec!["FindHouse", "CheckValue"]);
    assert_eq!(state.range.start, d("2024-05-01"));
    assert_eq!(state.range.end, d("2024-06-30"));
}

#[test]
fn dashboard_state_rejects_unknown_brand() {
    let brands = parse_brands("brands:\n  - name: FindHouse\n").unwrap();
    let err = dashboard_state(
        &brands,
        d("2024-06-30"),
        None,
        None,
        None,
        vec!["Nope".to_string()],
    )
    .unwrap_err();
    assert!(err.to_string().contains("unknown brand 'Nope'"));
}

fn unreachable_db_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://fttm@127.0.0.1:1/none".to_string(),
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        ..config(Environment::Production, admin_table())
    }
}

#[tokio::test]
async fn operator_login_fails_before_any_connection_attempt() {
    let brands = parse_brands("brands:\n  - name: FindHouse\n").unwrap();
    let Err(err) = Runtime::connect_as_operator(
        unreachable_db_config(),
        brands,
        Some("admin"),
        Some("wrong"),
    )
    .await
    else {
        panic!("wrong password must not yield a runtime");
    };

    let message = format!("{err:#}");
    assert!(message.contains("login failed"), "got: {message}");
    assert!(!message.contains("connect"), "got: {message}");
}

#[tokio::test]
async fn operator_with_valid_login_goes_on_to_connect() {
    let brands = parse_brands("brands:\n  - name: FindHouse\n").unwrap();
    let Err(err) = Runtime::connect_as_operator(
        unreachable_db_config(),
        brands,
        Some("admin"),
        Some("hunter2"),
    )
    .await
    else {
        panic!("nothing listens on port 1");
    };

    assert!(format!("{err:#}").contains("failed to connect to database"));
}
