use std::collections::BTreeMap;

use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

const ENV_VARS: [&str; 4] = [
    "LINEBRIDGE_DEVICE",
    "LINEBRIDGE_LOG_LEVEL",
    "LINEBRIDGE_MAX_LINE_BYTES",
    "RUST_LOG",
];

#[derive(Serialize)]
struct PlatformInfo {
    os: &'static str,
    arch: &'static str,
    family: &'static str,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    schema_id: &'static str,
    version: &'static str,
    target: String,
    git_hash: &'static str,
    platform: PlatformInfo,
    features: Vec<&'static str>,
    environment: BTreeMap<&'static str, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let environment = ENV_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    let output = EnvInfoOutput {
        schema_id: "https://schemas.linebridge.dev/cli/v1/envinfo.schema.json",
        version: env!("CARGO_PKG_VERSION"),
        target: target_triple(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        platform: PlatformInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        },
        features: active_features(),
        environment,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("LINEBRIDGE_BUILD_TARGET") {
        return target.to_string();
    }
    format!(
        "{}-unknown-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("linebridge environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!("  Git hash:   {}", output.git_hash);
            println!(
                "  Platform:   {} ({}, {})",
                output.platform.os, output.platform.arch, output.platform.family
            );
            println!("  Features:   {}", output.features.join(", "));
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<26} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}

pub(crate) fn active_features() -> Vec<&'static str> {
    let mut features = Vec::new();
    if cfg!(feature = "async") {
        features.push("async");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    features
}
