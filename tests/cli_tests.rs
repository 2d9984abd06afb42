use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    networks: PathBuf,
    checkpoints: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let networks = dir.path().join("networks");
        fs::create_dir(&networks).unwrap();

        // Ring with chords.
        let mut ring = String::from("# ring\n");
        for v in 0..20 {
            ring.push_str(&format!("n{} n{}\n", v, (v + 1) % 20));
            if v % 3 == 0 {
                ring.push_str(&format!("n{} n{}\n", v, (v + 7) % 20));
            }
        }
        fs::write(networks.join("ring.graph.txt"), ring).unwrap();

        // Two cliques joined by a bridge.
        let mut cliques = String::new();
        for base in [0, 6] {
            for u in base..base + 6 {
                for v in u + 1..base + 6 {
                    cliques.push_str(&format!("{} {}\n", u, v));
                }
            }
        }
        cliques.push_str("5 6\n");
        fs::write(networks.join("Cliques.graph.txt"), cliques).unwrap();

        let checkpoints = dir.path().join("checkpoints");
        Self {
            dir,
            networks,
            checkpoints,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_heurigen"))
            .args(args)
            .arg("--checkpoint-dir")
            .arg(&self.checkpoints)
            .output()
            .expect("Failed to execute binary")
    }

    fn checkpoint_path(&self) -> PathBuf {
        self.checkpoints.join("checkpoint.json")
    }
}

const TINY_SEARCH: &[&str] = &[
    "search",
    "--iterations",
    "6",
    "--graph-change-period",
    "3",
    "--checkpoint-period",
    "2",
    "--population-size",
    "4",
    "--max-depth",
    "4",
    "--node-count",
    "40",
    "--erdos-renyi-probabilities",
    "0.1",
    "--chung-lu-exponents=-2.0",
    "--chung-lu-min-degree",
    "2",
    "--chung-lu-max-degree",
    "10",
    "--seed",
    "1",
];

fn stored_iteration(path: &Path) -> u64 {
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    json["iteration"].as_u64().unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_search_resume_and_reset() {
    let ctx = TestContext::new();

    let output = ctx.run(TINY_SEARCH);
    assert_success(&output);
    assert_eq!(stored_iteration(&ctx.checkpoint_path()), 6);

    let progress = Regex::new(r"Iteration (\d+): \d+ solutions, average fitness -?\d+\.\d+").unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let iterations: Vec<u64> = progress
        .captures_iter(&stdout)
        .map(|c| c[1].parse().unwrap())
        .collect();
    // Every second iteration, plus the end of each segment.
    assert_eq!(iterations, vec![2, 2, 4, 5, 6, 6]);

    let mut longer = TINY_SEARCH.to_vec();
    longer[2] = "8";
    assert_success(&ctx.run(&longer));
    assert_eq!(stored_iteration(&ctx.checkpoint_path()), 8);

    assert_success(&ctx.run(&["reset"]));
    assert!(!ctx.checkpoint_path().exists());
}

#[test]
fn test_cli_debug_logs_admission_decisions() {
    let ctx = TestContext::new();
    let quiet = ctx.run(TINY_SEARCH);
    assert_success(&quiet);
    assert!(!String::from_utf8_lossy(&quiet.stdout).contains("Admitted a program"));

    assert_success(&ctx.run(&["reset"]));
    let mut args = TINY_SEARCH.to_vec();
    args.push("--debug");
    let output = ctx.run(&args);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let admitted = Regex::new(r"Admitted a program of length \d+ into slot \d+ \(fitness ").unwrap();
    // The four seeds enter every segment's fresh population.
    assert!(admitted.find_iter(&stdout).count() >= 4, "stdout:\n{}", stdout);

    let decision = Regex::new(r"(Admitted a program|Rejected a program|Replaced the duplicate in|Evicted the worst occupant of)").unwrap();
    // At least one decision per seed and per sampled iteration.
    assert!(decision.find_iter(&stdout).count() >= 4 + 6);
}

#[test]
fn test_cli_show_ranks_on_directory() {
    let ctx = TestContext::new();
    let output = ctx.run(&["show", "--networks", ctx.networks.to_str().unwrap(), "--top", "3"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Avg Rank"));
    assert!(stdout.contains("Cliques"));
    assert!(stdout.contains("ring"));
    assert!(stdout.contains("degree(node)"));
}

#[test]
fn test_cli_benchmark_writes_csv() {
    let ctx = TestContext::new();
    let csv_path = ctx.dir.path().join("results.csv");
    let output = ctx.run(&[
        "benchmark",
        "--networks",
        ctx.networks.to_str().unwrap(),
        "--heuristics",
        "mdg,elph",
        "--shapley-rounds",
        "2",
        "--deflation-factor-count",
        "2",
        "--csv",
        csv_path.to_str().unwrap(),
    ]);
    assert_success(&output);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "network");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    // 2 networks, 2 heuristics, 5 variants.
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|row| &row[5] == "true"));
    assert_eq!(&rows[0][0], "Cliques");
}

#[test]
fn test_cli_rejects_invalid_parameters() {
    let ctx = TestContext::new();
    let output = ctx.run(&["search", "--max-depth", "1"]);
    assert!(!output.status.success());
    assert!(!ctx.checkpoint_path().exists());
}

#[test]
fn test_cli_config_file_is_overridden_by_flags() {
    let ctx = TestContext::new();
    let config_path = ctx.dir.path().join("params.json");
    fs::write(&config_path, r#"{"search": {"iterations": 4}, "model": {"max_depth": 1}}"#).unwrap();

    let mut args = vec!["--config", config_path.to_str().unwrap()];
    args.extend_from_slice(TINY_SEARCH);
    // max_depth 1 from the file is replaced by --max-depth 4; iterations 6 wins over 4.
    assert_success(&ctx.run(&args));
    assert_eq!(stored_iteration(&ctx.checkpoint_path()), 6);
}
