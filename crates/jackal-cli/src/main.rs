mod cli;
mod config;
mod remote;

use clap::Parser;
use color_eyre::Result;
use jackal_core::{SaveReceipt, UsageReport};
use jackal_crypto::SymmetricKey;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;

    match cli.command {
        cli::Command::Keygen => run_keygen(),
        cli::Command::Provision { jackal_address } => {
            let client = remote::client_from_config(&config)?;
            let receipt = client.provision(&jackal_address).await?;
            println!(
                "Provisioned - address: {}  tx: {}",
                receipt.jackal_address, receipt.tx_hash
            );
        }
        cli::Command::Save { key, content } => {
            let client = remote::client_from_config(&config)?;
            let receipt = client.save(&key, content.as_bytes()).await?;
            for warning in &receipt.warnings {
                warn!("service warning: {warning}");
            }
            println!("{}", save_summary(&receipt));
        }
        cli::Command::Load { key } => {
            let client = remote::client_from_config(&config)?;
            let opened = client.load(&key).await?;
            println!("{}", String::from_utf8_lossy(&opened.into_bytes()));
        }
        cli::Command::Usage => {
            let client = remote::client_from_config(&config)?;
            let report = client.usage().await?;
            print!("{}", usage_summary(&report));
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info. Diagnostics (including
    // the one-time generated-key notice) go to stderr; stdout stays the
    // primary output stream.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Generate a key locally and print it with setup instructions. Does not
/// touch the key file or the network.
fn run_keygen() {
    let key = SymmetricKey::generate();
    println!("\nGenerated encryption key:\n\n  {}\n", key.to_hex());
    println!("Add to your environment:");
    println!("  export JACKAL_MEMORY_ENCRYPTION_KEY={}\n", key.to_hex());
    println!("Keep this key safe - lose it and your encrypted memories are unrecoverable.");
}

fn save_summary(receipt: &SaveReceipt) -> String {
    let mut line = format!("Saved - key: {}  cid: {}", receipt.key, receipt.cid);
    if let (Some(used), Some(quota)) = (receipt.bytes_used, receipt.quota_bytes) {
        line.push_str(&format!(
            "  usage: {} of {}",
            format_bytes(used),
            format_bytes(quota)
        ));
    }
    line
}

fn usage_summary(report: &UsageReport) -> String {
    format!(
        "Used:  {}\nQuota: {}\nUsage: {:.1}%\n",
        format_bytes(report.bytes_used),
        format_bytes(report.quota_bytes),
        report.percent_used
    )
}

/// Display-only unit conversion; the underlying values are the service's.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
