use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "object_copy_lambda";
const LAMBDA_BINARY: &str = "copy_lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the object copy workspace",
    long_about = "A unified CLI for testing, CI checks and Lambda packaging\n\
                  in the object copy workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suites of all crates
    Test,
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and zip the copy Lambda as a `bootstrap` artifact
    LambdaPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip artifact
        #[arg(long, default_value = "dist")]
        dist_dir: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Formatting, clippy, and tests
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

type TaskResult = Result<(), String>;

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) -> TaskResult {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("could not spawn cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with {status}", args.join(" ")))
    }
}

fn lambda_build_args<'a>(target: &'a str, profile: BuildProfile) -> Vec<&'a str> {
    let mut args = vec!["build", "-p", LAMBDA_PACKAGE, "--bin", LAMBDA_BINARY];
    args.extend(["--target", target]);
    args.extend(profile.as_cargo_flag());
    args
}

fn package_copy_lambda(target: &str, profile: BuildProfile, dist_dir: &Path) -> TaskResult {
    check_target_installed(target)?;

    step("Build copy lambda binary");
    run_cargo(&lambda_build_args(target, profile))?;

    step("Package lambda zip artifact");
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(binary_name(LAMBDA_BINARY, target));
    let zip_path = dist_dir.join(format!("{LAMBDA_BINARY}.zip"));
    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("cannot create {}: {error}", dist_dir.display()))?;
    write_bootstrap_zip(&binary_path, &zip_path)
        .map_err(|error| format!("cannot package {}: {error}", binary_path.display()))?;

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
    Ok(())
}

/// Skipped with a warning when rustup itself is unavailable.
fn check_target_installed(target: &str) -> TaskResult {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            return Err(format!(
                "`rustup target list --installed` failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Err(error) => {
            eprintln!("warning: rustup unavailable ({error}), skipping target check");
            return Ok(());
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!(
            "rust target `{target}` is missing; run `rustup target add {target}` first"
        ))
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

/// The Lambda custom runtime expects an executable named `bootstrap` at the
/// archive root.
fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> std::io::Result<()> {
    let binary = fs::read(binary_path)?;
    let mut zip = ZipWriter::new(fs::File::create(zip_path)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)?;
    zip.write_all(&binary)?;
    zip.finish()?;
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() -> TaskResult {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

fn run_tests() -> TaskResult {
    for package in ["object_copy_core", LAMBDA_PACKAGE, "xtask"] {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package])?;
    }
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Test => run_tests(),
        Commands::Ci { job } => {
            let outcome = match job {
                CiJob::Lint => ci_lint(),
                CiJob::Check => ci_lint().and_then(|()| run_tests()),
            };
            if outcome.is_ok() {
                eprintln!("\nCI job passed.");
            }
            outcome
        }
        Commands::LambdaPackage {
            target,
            profile,
            dist_dir,
        } => package_copy_lambda(&target, profile, Path::new(&dist_dir)),
    };

    if let Err(message) = result {
        eprintln!("\nerror: {message}");
        exit(1);
    }
}
