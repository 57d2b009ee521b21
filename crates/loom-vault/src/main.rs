// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loom vault command-line binary.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use loom_vault::{open_vault, BootstrapError, ErrorKind, Vault, VaultServiceError};
use loom_vault_config::{LogFormat, LoggingConfig, VaultConfig};
use loom_vault_store::{SecretValue, Version};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loom vault - versioned secret storage behind a policy gate.
#[derive(Parser, Debug)]
#[command(name = "loom-vault", about = "Loom secrets vault", version)]
struct Args {
	/// Config file to read instead of /etc/loom/vault.toml
	#[arg(long, global = true, env = "LOOM_VAULT_CONFIG")]
	config: Option<PathBuf>,

	/// Identity every request is authorized as
	#[arg(
		long,
		global = true,
		env = "LOOM_VAULT_SUBJECT",
		default_value = "anonymous"
	)]
	subject: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Write a new version of a secret (value read from stdin when omitted)
	Write { key: String, value: Option<String> },
	/// Print the current value, or a specific version
	Read {
		key: String,
		#[arg(long)]
		version: Option<Version>,
	},
	/// List the versions of a secret with their write times
	Versions { key: String },
	/// List keys starting with a prefix
	List {
		#[arg(default_value = "")]
		prefix: String,
	},
	/// Ask the policy gate for a decision without touching storage
	Authorize {
		identity: String,
		action: String,
		resource: String,
	},
	/// Import a legacy secrets.json dump into an empty vault
	ImportLegacy { path: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
	// Load .env file if present
	let args = parse_args(
		|| {
			dotenvy::dotenv().ok();
		},
		std::env::args_os(),
	)
	.unwrap_or_else(|e| e.exit());

	match run(args).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			match error_kind(&e) {
				Some(kind) => eprintln!("error [{kind}]: {e:#}"),
				None => eprintln!("error: {e:#}"),
			}
			ExitCode::FAILURE
		}
	}
}

/// Run `load_env` before clap resolves the `LOOM_VAULT_*` fallbacks.
fn parse_args<I, T>(load_env: impl FnOnce(), argv: I) -> Result<Args, clap::Error>
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	load_env();
	Args::try_parse_from(argv)
}

async fn run(args: Args) -> anyhow::Result<()> {
	let config = match &args.config {
		Some(path) => loom_vault_config::load_config_with_file(path),
		None => loom_vault_config::load_config(),
	}
	.map_err(BootstrapError::from)?;

	init_tracing(&config.logging);
	log_config(&config);

	let vault = open_vault(&config).await?;
	let result = execute(&vault, &args.subject, args.command).await;
	let closed = vault.close().await;

	result?;
	closed?;
	Ok(())
}

async fn execute(vault: &Vault, subject: &str, command: Command) -> anyhow::Result<()> {
	match command {
		Command::Write { key, value } => {
			let value = match value {
				Some(v) => SecretValue::new(v),
				None => read_stdin_value().await?,
			};
			let version = vault.write(subject, &key, &value).await?;
			println!("{version}");
		}
		Command::Read { key, version } => {
			let read = match version {
				Some(v) => vault.read_version(subject, &key, v).await?,
				None => vault.read(subject, &key).await?,
			};
			eprintln!("version {}", read.version);
			println!("{}", read.value.expose());
		}
		Command::Versions { key } => {
			for info in vault.list_version_info(subject, &key).await? {
				println!("{}\t{}", info.version, info.created_at.to_rfc3339());
			}
		}
		Command::List { prefix } => {
			for key in vault.list_keys(subject, &prefix).await? {
				println!("{key}");
			}
		}
		Command::Authorize {
			identity,
			action,
			resource,
		} => {
			let decision = vault.authorize(&identity, &action, &resource);
			println!("{}", serde_json::to_string_pretty(&decision)?);
		}
		Command::ImportLegacy { path } => {
			let summary = vault.import_legacy(subject, &path).await?;
			println!(
				"imported {} keys ({} versions)",
				summary.keys, summary.versions
			);
		}
	}

	Ok(())
}

async fn read_stdin_value() -> anyhow::Result<SecretValue> {
	let mut raw = String::new();
	tokio::io::stdin().read_to_string(&mut raw).await?;
	let trimmed = raw.strip_suffix('\n').unwrap_or(&raw);
	let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
	Ok(SecretValue::new(trimmed))
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

fn log_config(config: &VaultConfig) {
	tracing::info!(
		database = %config.storage.database_path().display(),
		max_connections = config.storage.max_connections,
		policy_namespace = %config.policy.namespace,
		policy_candidates = config.policy.paths.len(),
		log_level = %config.logging.level,
		"Vault configuration loaded"
	);
}

fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
	if let Some(e) = err.downcast_ref::<VaultServiceError>() {
		return Some(e.kind());
	}
	err.downcast_ref::<BootstrapError>().map(BootstrapError::kind)
}
