//! ti: command-line front end for trusted introductions.
//!
//! Opens the LMDB store, runs one operation through the introduction service and prints
//! the result, together with any trust events it produced, as JSON on stdout.

mod config;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};

use ti_store_lmdb::LmdbTrustStore;
use ti_trust::IntroductionService;
use ti_types::{IdentityAddress, IntroductionId, IntroductionRecord, Outcome, VerificationLevel};
use ti_utils::LogFormat;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "ti", about = "Trusted introductions: record, resolve and gate on introductions")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TI_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "TI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "TI_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TI_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TI_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Store an introduction given as a flat JSON document ("-" reads stdin).
    Submit { document: String },
    /// Accept an introduction.
    Accept { id: u64 },
    /// Reject an introduction.
    Reject { id: u64 },
    /// Mark an introduction as superseded.
    Stale { id: u64 },
    /// The identity key of an address changed.
    KeyChanged { address: IdentityAddress },
    /// Show the verification level of an address.
    Level { address: IdentityAddress },
    /// Whether an address may introduce others.
    CanForward { address: IdentityAddress },
    /// Whether an address may be introduced to us.
    CanReceive { address: IdentityAddress },
    /// List introductions that still name an introducer, or all records of one introducee.
    List {
        #[arg(long)]
        introducee: Option<IdentityAddress>,
    },
    /// List contacts this device may introduce to others.
    Forwardable,
    /// Record a successful out-of-band fingerprint comparison.
    VerifyDirect { address: IdentityAddress },
    /// Toggle the manual verification mark.
    ToggleManual {
        address: IdentityAddress,
        /// Confirm clearing a strong verification level.
        #[arg(long)]
        confirm: bool,
    },
    /// Drop the introducer from an introduction.
    ForgetIntroducer { id: u64 },
    /// Delete a rejected or stale introduction.
    Delete { id: u64 },
    /// Forget the verification level of an address.
    Purge { address: IdentityAddress },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(map_size_mb) = cli.map_size_mb {
        config.map_size_mb = map_size_mb;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    ti_utils::init_logging(config.log_format, &config.log_level);

    let store = LmdbTrustStore::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    tracing::debug!(data_dir = %config.data_dir.display(), "store opened");
    let service = IntroductionService::new(Arc::new(store));

    let result = run(&service, cli.command)?;
    let output = json!({
        "result": result,
        "events": service.drain_events(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(service: &IntroductionService<LmdbTrustStore>, command: Command) -> anyhow::Result<Value> {
    let value = match command {
        Command::Submit { document } => {
            let document = if document == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading document from stdin")?;
                buf
            } else {
                document
            };
            let id = service.submit_document(&document)?;
            json!({ "id": id })
        }
        Command::Accept { id } => {
            let id = IntroductionId::new(id);
            transition_json(id, service.resolve_introduction(id, Outcome::Accepted)?)
        }
        Command::Reject { id } => {
            let id = IntroductionId::new(id);
            transition_json(id, service.resolve_introduction(id, Outcome::Rejected)?)
        }
        Command::Stale { id } => {
            let id = IntroductionId::new(id);
            transition_json(id, service.mark_stale(id)?)
        }
        Command::KeyChanged { address } => {
            level_json(&address, service.identity_key_changed(&address)?)
        }
        Command::Level { address } => level_json(&address, service.current_level(&address)?),
        Command::CanForward { address } => {
            json!({ "address": address.as_str(), "allowed": service.can_forward(&address)? })
        }
        Command::CanReceive { address } => {
            json!({ "address": address.as_str(), "allowed": service.can_receive(&address)? })
        }
        Command::List { introducee } => {
            let records = match introducee {
                Some(address) => service.introductions_for(&address)?,
                None => service.displayable_introductions()?,
            };
            let documents = records
                .iter()
                .map(record_json)
                .collect::<anyhow::Result<Vec<_>>>()?;
            Value::Array(documents)
        }
        Command::Forwardable => {
            let contacts = service.forwardable_contacts()?;
            let addresses: Vec<&str> = contacts.iter().map(IdentityAddress::as_str).collect();
            json!(addresses)
        }
        Command::VerifyDirect { address } => {
            level_json(&address, service.record_direct_verification(&address)?)
        }
        Command::ToggleManual { address, confirm } => {
            level_json(&address, service.toggle_manual_verification(&address, confirm)?)
        }
        Command::ForgetIntroducer { id } => {
            record_json(&service.forget_introducer(IntroductionId::new(id))?)?
        }
        Command::Delete { id } => {
            service.delete_introduction(IntroductionId::new(id))?;
            json!({ "deleted": id })
        }
        Command::Purge { address } => {
            service.purge_identity(&address)?;
            json!({ "purged": address.as_str() })
        }
    };
    Ok(value)
}

fn level_json(address: &IdentityAddress, level: VerificationLevel) -> Value {
    json!({
        "address": address.as_str(),
        "level": level.as_str(),
        "code": level.code(),
        "coarse": level.coarse(),
    })
}

fn transition_json(id: IntroductionId, level: VerificationLevel) -> Value {
    json!({
        "id": id,
        "level": level.as_str(),
        "code": level.code(),
    })
}

fn record_json(record: &IntroductionRecord) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&record.to_document()?)?)
}
