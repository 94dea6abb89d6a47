use clap::Parser;
use mysql_detect::cli::Cli;

#[test]
fn defaults() {
    let cli = <Cli as Parser>::try_parse_from(["mysql-detect", "-t", "127.0.0.1:3306"]).unwrap();
    assert_eq!(cli.targets, vec!["127.0.0.1:3306"]);
    assert_eq!(cli.timeout, 1);
    assert_eq!(cli.concurrency, 16);
    assert!(!cli.json);
    assert!(cli.json_out.is_empty());
    assert_eq!(cli.verbose, 0);
}

#[test]
fn repeated_targets_and_flags() {
    let cli = <Cli as Parser>::try_parse_from([
        "mysql-detect", "-t", "a:3306", "--target", "b", "--timeout", "5", "--json", "-vv",
    ])
    .unwrap();
    assert_eq!(cli.targets, vec!["a:3306", "b"]);
    assert_eq!(cli.timeout, 5);
    assert!(cli.json);
    assert_eq!(cli.verbose, 2);
}

#[test]
fn target_is_required_and_timeout_positive() {
    assert!(<Cli as Parser>::try_parse_from(["mysql-detect"]).is_err());
    assert!(<Cli as Parser>::try_parse_from(["mysql-detect", "-t", "a", "--timeout", "0"]).is_err());
}
