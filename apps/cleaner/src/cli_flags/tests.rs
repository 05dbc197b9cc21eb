use std::path::PathBuf;

use clap::Parser;

use cleaner_application::ClusterListSource;

use super::{CliFlags, Operation, split_cluster_tokens};

const CLUSTER: &str = "5d5892d4-1f74-4ccf-91af-548dfc9767aa";

fn parse(arguments: &[&str]) -> CliFlags {
    let mut argv = vec!["cleaner"];
    argv.extend_from_slice(arguments);
    CliFlags::try_parse_from(argv).unwrap_or_else(|error| panic!("test: {error}"))
}

#[test]
fn no_flags_default_to_displaying_old_records() {
    let flags = parse(&[]);
    assert_eq!(flags.operation(), Operation::DisplayOld);
    assert_eq!(flags.limit(), 1000);
    assert!(!flags.dry_run);
}

#[test]
fn first_operation_in_declaration_order_wins() {
    assert_eq!(
        parse(&["--cleanup", "--show-version"]).operation(),
        Operation::ShowVersion
    );
    assert_eq!(
        parse(&["--vacuum", "--summary"]).operation(),
        Operation::Summary
    );
    assert_eq!(parse(&["--vacuum"]).operation(), Operation::Vacuum);
}

#[test]
fn dry_run_is_only_accepted_with_cleanup() {
    assert!(CliFlags::try_parse_from(["cleaner", "--dry-run"]).is_err());
    assert!(CliFlags::try_parse_from(["cleaner", "--summary", "--dry-run"]).is_err());

    let flags = parse(&["--cleanup", "--dry-run"]);
    assert_eq!(flags.operation(), Operation::Cleanup);
    assert!(flags.dry_run);
}

#[test]
fn limit_outside_range_is_rejected() {
    assert!(CliFlags::try_parse_from(["cleaner", "--limit", "0"]).is_err());
    assert!(CliFlags::try_parse_from(["cleaner", "--limit", "100001"]).is_err());
    assert_eq!(parse(&["--limit", "5"]).limit(), 5);
}

#[test]
fn empty_tokens_are_kept_for_malformed_counting() {
    assert_eq!(split_cluster_tokens("a,,b"), vec!["a", "", "b"]);
    assert_eq!(split_cluster_tokens(""), vec![""]);
    assert_eq!(split_cluster_tokens(CLUSTER), vec![CLUSTER]);
}

#[test]
fn cluster_flag_takes_precedence_over_configured_file() {
    let configured = PathBuf::from("clusters.txt");
    let value = format!("{CLUSTER},oops");
    let flags = parse(&["--clusters", value.as_str()]);

    match flags.cluster_source(Some(&configured)) {
        ClusterListSource::Arguments(tokens) => assert_eq!(tokens, vec![CLUSTER, "oops"]),
        other => panic!("unexpected source: {other}"),
    }
}

#[test]
fn configured_file_is_used_without_cluster_flag() {
    let configured = PathBuf::from("clusters.txt");
    let flags = parse(&["--cleanup"]);

    assert!(matches!(
        flags.cluster_source(Some(&configured)),
        ClusterListSource::File(path) if path == configured
    ));
    assert!(matches!(
        flags.cluster_source(None),
        ClusterListSource::Unrestricted
    ));
}

#[test]
fn arguments_with_a_malformed_token_resolve_with_a_count() {
    let flags = parse(&["--clusters", &format!("{CLUSTER},,{CLUSTER}")]);
    let resolution = flags
        .cluster_source(None)
        .resolve()
        .unwrap_or_else(|_| panic!("test"));

    assert_eq!(resolution.clusters().len(), 1);
    assert_eq!(resolution.malformed_count(), 1);
}
