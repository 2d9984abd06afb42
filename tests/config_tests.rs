use clap::{CommandFactory, FromArgMatches, Parser};
use heurigen::config::{BatteryParams, Config, ModelParams, SearchParams};
use rstest::rstest;
use std::io::Write;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    config: Config,
}

fn parse(args: &[&str]) -> (Config, clap::ArgMatches) {
    let matches = TestCli::command().get_matches_from(std::iter::once("test").chain(args.iter().copied()));
    let cli = TestCli::from_arg_matches(&matches).unwrap();
    (cli.config, matches)
}

#[test]
fn test_defaults_are_valid_and_match_clap() {
    let (parsed, _) = parse(&[]);
    let default = Config::default();
    parsed.validate().unwrap();
    default.validate().unwrap();
    assert_eq!(parsed.model.max_depth, default.model.max_depth);
    assert_eq!(parsed.search.iterations, default.search.iterations);
    assert_eq!(
        parsed.battery.chung_lu_exponents,
        default.battery.chung_lu_exponents
    );
}

#[test]
fn test_cli_overrides_only_explicit_flags() {
    let (cli, matches) = parse(&["--max-depth", "9", "--erdos-renyi-probabilities", "0.2,0.3"]);

    let mut file: Config =
        serde_json::from_str(r#"{"model": {"max_depth": 3, "tournament_size": 7}}"#).unwrap();
    file.merge_from_cli(&cli, &matches);

    assert_eq!(file.model.max_depth, 9);
    assert_eq!(file.model.tournament_size, 7);
    assert_eq!(file.battery.erdos_renyi_probabilities, vec![0.2, 0.3]);
    assert_eq!(file.search.population_size, SearchParams::default().population_size);
}

#[test]
fn test_negative_exponents_parse() {
    let (cli, _) = parse(&["--chung-lu-exponents", "-1.5,-3"]);
    assert_eq!(cli.battery.chung_lu_exponents, vec![-1.5, -3.0]);
}

#[test]
fn test_load_from_file_fills_missing_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"search": {{"iterations": 50}}}}"#).unwrap();
    let config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.search.iterations, 50);
    assert_eq!(config.search.checkpoint_period, 10);
    assert_eq!(config.model.max_depth, 6);
}

#[rstest]
#[case::shallow(ModelParams { max_depth: 1, ..ModelParams::default() })]
#[case::no_tournament(ModelParams { tournament_size: 0, ..ModelParams::default() })]
#[case::mixture_above_one(ModelParams { mixture_weight_for_rules: 1.5, ..ModelParams::default() })]
fn test_invalid_model_params(#[case] model: ModelParams) {
    let config = Config {
        model,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[rstest]
#[case::empty(BatteryParams { erdos_renyi_probabilities: vec![], chung_lu_exponents: vec![], ..BatteryParams::default() })]
#[case::probability(BatteryParams { erdos_renyi_probabilities: vec![1.5], ..BatteryParams::default() })]
#[case::exponent(BatteryParams { chung_lu_exponents: vec![-0.5], ..BatteryParams::default() })]
#[case::degrees(BatteryParams { chung_lu_min_degree: 50, chung_lu_max_degree: 10, ..BatteryParams::default() })]
fn test_invalid_battery_params(#[case] battery: BatteryParams) {
    assert!(battery.validate().is_err());
}

#[test]
fn test_zero_periods_are_rejected() {
    let search = SearchParams {
        checkpoint_period: 0,
        ..SearchParams::default()
    };
    assert!(search.validate().is_err());
}
