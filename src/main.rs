use clap::{Parser, Subcommand, ValueEnum};
use filetest::config::{Overrides, RunSettings};
use filetest::executor::ShellExecutor;
use filetest::{Summary, TestCase, TestRunner, filter, loader, report};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with checkmarks
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
    /// JUnit XML output for CI systems
    Junit,
}

#[derive(Parser)]
#[command(name = "filetest")]
#[command(about = "Run plain-text test cases against an external command")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute test files
    Run {
        /// Directory or file to test
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Command template to execute (use {input} as placeholder)
        #[arg(short, long)]
        command: Option<String>,
        /// Run only tests with any of these tags (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,
        /// Test file name pattern (default: *.test)
        #[arg(short, long)]
        pattern: Option<String>,
        /// Filter tests by name (substring match)
        #[arg(short, long)]
        filter: Option<String>,
        /// Timeout per test in seconds (default: 30)
        #[arg(long)]
        timeout: Option<u64>,
        /// Output format
        #[arg(short, long, default_value = "human")]
        output: OutputFormat,
        /// Show details for passing tests too
        #[arg(short, long)]
        verbose: bool,
    },
    /// Parse test files without running them
    Validate {
        /// Directory or file to check
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Test file name pattern (default: *.test)
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Scaffold a sample test file
    Init {
        /// Output path for the new test file
        #[arg(default_value = "tests/sample.test")]
        path: PathBuf,
    },
    /// Output the JSON schema of the suite config file
    Schema,
}

const SAMPLE_TEST_FILE: &str = "\
### TEST: Addition Test
DESCRIPTION: Test basic addition
TYPE: exact
TAGS: math, basic
INPUT:
2 + 2
EXPECTED:
4

### TEST: Multiplication Test
DESCRIPTION: Test multiplication
TYPE: exact
TAGS: math, basic
INPUT:
5 * 3
EXPECTED:
15

### TEST: Division Test
DESCRIPTION: Test division with decimal result
TYPE: contains
TAGS: math, decimal
INPUT:
10 / 3
EXPECTED:
3.3
";

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            path,
            command,
            tags,
            pattern,
            filter: name_filter,
            timeout,
            output,
            verbose,
        } => {
            let overrides = Overrides {
                command,
                timeout,
                pattern,
                tags: tags.as_deref().map(filter::parse_tag_list),
            };
            let settings = resolve_settings(&path, overrides);

            let (cases, load_failures) = load_cases(&path, &settings.pattern);
            let mut cases = filter::filter_by_tags(cases, &settings.tags);
            if let Some(ref f) = name_filter {
                cases = filter::filter_by_name(cases, f);
            }

            if cases.is_empty() {
                eprintln!("No tests found to run");
                std::process::exit(1);
            }

            if matches!(output, OutputFormat::Human) {
                eprintln!("Running {} test(s)...", cases.len());
            }

            let runner = TestRunner::new(settings.command)
                .with_timeout(settings.timeout)
                .with_executor(ShellExecutor::new().with_env(settings.env));
            let results = runner.run_all(&cases);
            let summary = Summary::from_results(&results);

            match output {
                OutputFormat::Human => print!("{}", report::render_human(&results, verbose)),
                OutputFormat::Json => {
                    let json = report::render_json(&results, chrono::Utc::now());
                    match serde_json::to_string_pretty(&json) {
                        Ok(text) => println!("{text}"),
                        Err(e) => {
                            eprintln!("Error serializing results: {e}");
                            std::process::exit(1);
                        }
                    }
                }
                OutputFormat::Junit => {
                    print!("{}", report::render_junit(&results, chrono::Utc::now()));
                }
            }

            if !summary.all_passed() || load_failures > 0 {
                std::process::exit(1);
            }
        }
        Command::Validate { path, pattern } => {
            let settings = resolve_settings(
                &path,
                Overrides {
                    pattern,
                    ..Overrides::default()
                },
            );
            let files = find_files(&path, &settings.pattern);

            let mut errors = 0;
            for file in &files {
                match loader::parse_file(file) {
                    Ok(cases) => println!("✓ {} ({} tests)", file.display(), cases.len()),
                    Err(e) => {
                        eprintln!("✗ {e}");
                        errors += 1;
                    }
                }
            }

            if errors > 0 {
                eprintln!("\n{errors} file(s) failed validation");
                std::process::exit(1);
            }
            println!("\nAll {} file(s) valid", files.len());
        }
        Command::Init { path } => {
            if path.exists() {
                eprintln!("Error: file already exists: {}", path.display());
                std::process::exit(1);
            }
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
                && let Err(e) = fs::create_dir_all(parent)
            {
                eprintln!("Error creating directory: {e}");
                std::process::exit(1);
            }
            if let Err(e) = fs::write(&path, SAMPLE_TEST_FILE) {
                eprintln!("Error writing file: {e}");
                std::process::exit(1);
            }
            println!("Created: {}", path.display());
        }
        Command::Schema => {
            let schema = filetest::config::generate_schema();
            match serde_json::to_string_pretty(&schema) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing schema: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Logs go to stderr. `FILETEST_LOG` takes an `EnvFilter` directive;
/// `TEST_DEBUG` turns on debug output for this crate.
fn init_tracing() {
    let default = if std::env::var_os("TEST_DEBUG").is_some() {
        "filetest=debug"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FILETEST_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the suite config next to `path` and merge it with the flags.
fn resolve_settings(path: &Path, overrides: Overrides) -> RunSettings {
    let test_root = if path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    };

    let suite_config = match loader::load_suite_config(test_root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading suite config: {e}");
            std::process::exit(1);
        }
    };

    match RunSettings::resolve(suite_config.as_ref(), overrides) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error in suite config: {e}");
            std::process::exit(1);
        }
    }
}

fn find_files(path: &Path, pattern: &str) -> Vec<PathBuf> {
    let files = match loader::find_test_files(path, pattern) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error finding test files: {e}");
            std::process::exit(1);
        }
    };
    if files.is_empty() {
        eprintln!(
            "No test files found matching '{pattern}' in '{}'",
            path.display()
        );
        std::process::exit(1);
    }
    files
}

/// Parse every test file, reporting unreadable ones and carrying on.
fn load_cases(path: &Path, pattern: &str) -> (Vec<TestCase>, usize) {
    let files = find_files(path, pattern);
    eprintln!("Found {} test file(s)", files.len());

    let mut cases = Vec::new();
    let mut failures = 0;
    for file in &files {
        match loader::parse_file(file) {
            Ok(parsed) => cases.extend(parsed),
            Err(e) => {
                eprintln!("Error parsing {}: {e}", file.display());
                failures += 1;
            }
        }
    }
    (cases, failures)
}
