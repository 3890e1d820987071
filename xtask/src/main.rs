use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use prost::Message;
use prost_reflect::{DynamicMessage, Value as ProtoValue};
use protodecode_core::schema::demo_message_descriptor;
use serde_json::{json, Value};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "protodecode_lambda";
const LAMBDA_BINARY: &str = "protodecode_lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the protodecode workspace",
    long_about = "A unified CLI for CI checks, Lambda packaging, and local\n\
                  test events in the protodecode workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci,
    /// Build and package the Rust Lambda artifact
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Write a Kinesis-shaped test event carrying demo records
    SampleEvent {
        /// Number of well-formed records
        #[arg(long, default_value_t = 3)]
        count: usize,
        /// Append one record whose payload does not decode
        #[arg(long)]
        malformed: bool,
        /// Output file path
        #[arg(long, default_value = "sample_event.json")]
        output: String,
    },
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

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambda(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build lambda binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BINARY,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new("dist");
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let zip_path = dist_dir.join("protodecode.zip");
    package_lambda_zip(
        &target_dir.join(binary_name(LAMBDA_BINARY, target)),
        &zip_path,
    );

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        );
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── sample events ──────────────────────────────────────────────────

fn demo_record_payload(index: usize) -> Vec<u8> {
    let descriptor = demo_message_descriptor().expect("demo schema should load");
    let mut message = DynamicMessage::new(descriptor);
    let id = i32::try_from(index + 1).unwrap_or(i32::MAX);
    message.set_field_by_name("id", ProtoValue::I32(id));
    message.set_field_by_name("name", ProtoValue::String(format!("user-{id}")));
    message.set_field_by_name("active", ProtoValue::Bool(index % 2 == 0));
    message.set_field_by_name("amount", ProtoValue::F64(f64::from(id) * 10.5));
    message.set_field_by_name(
        "tags",
        ProtoValue::List(vec![ProtoValue::String("sample".to_string())]),
    );
    message.encode_to_vec()
}

fn kinesis_record(sequence: usize, payload: &[u8]) -> Value {
    json!({
        "eventSource": "aws:kinesis",
        "eventName": "aws:kinesis:record",
        "eventVersion": "1.0",
        "kinesis": {
            "kinesisSchemaVersion": "1.0",
            "partitionKey": "demo",
            "sequenceNumber": sequence.to_string(),
            "data": STANDARD.encode(payload),
        }
    })
}

fn write_sample_event(count: usize, malformed: bool, output: &str) {
    let mut records: Vec<Value> = (0..count)
        .map(|index| kinesis_record(index, &demo_record_payload(index)))
        .collect();
    if malformed {
        // field 2 declares 5 bytes but carries 1
        records.push(kinesis_record(count, &[0x12, 0x05, b'A']));
    }

    let event = json!({ "Records": records });
    let body = serde_json::to_string_pretty(&event).expect("failed to serialize sample event");
    fs::write(output, body).expect("failed to write sample event");
    eprintln!("Wrote {} record(s) to {output}", records.len());
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test protodecode_core");
    run_cargo(&["test", "-p", "protodecode_core"]);

    step("Test protodecode_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => {
            ci_check();
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambda(&target, profile);
        }
        Commands::SampleEvent {
            count,
            malformed,
            output,
        } => {
            write_sample_event(count, malformed, &output);
        }
    }
}
