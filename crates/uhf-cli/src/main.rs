//! `uhf-demo`: drives the bridge end to end against a simulated reader.
//!
//! ```text
//! uhf-demo --power 20 --region europe --mode epc-tid --tags 5 --rounds 3
//! ```
//!
//! Set `RUST_LOG=debug` for adapter and relay internals.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uhf_bridge::{BridgeConfig, UhfClient};
use uhf_core::{FrequencyRegion, MemoryBank};
use uhf_hardware::mock::{MockKeySource, MockUhfReader, SimulatedTag};
use uhf_hardware::{AnyKeySource, AnyUhfReader};

const ROUND_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "uhf-demo", version, about = "Simulated UHF RFID reader session")]
struct Cli {
    /// Bridge configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transmit power in dBm (0-30).
    #[arg(long, default_value_t = 26, allow_negative_numbers = true)]
    power: i32,

    /// Frequency region (china-840, china-920, europe, usa, korea, japan).
    #[arg(long, default_value = "usa")]
    region: FrequencyRegion,

    /// Banks reported per inventoried tag.
    #[arg(long, value_enum, default_value_t = Mode::Epc)]
    mode: Mode,

    /// Number of simulated tags in the field.
    #[arg(long, default_value_t = 3)]
    tags: u32,

    /// Inventory rounds to run.
    #[arg(long, default_value_t = 5)]
    rounds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Epc,
    EpcTid,
    EpcTidUser,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn simulated_epc(index: u32) -> String {
    format!("E2003412{:016X}", u64::from(index) + 1)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    let trigger_code = config.trigger_key_codes.first().copied();

    let (reader, field) = MockUhfReader::new();
    for index in 0..cli.tags {
        let tag = SimulatedTag::new(&simulated_epc(index))?
            .with_tid(&format!("E2801160{:08X}", 0x2000_0000_u32.wrapping_add(index)))?
            .with_rssi(format!("-{}.{:02}", 48 + index % 20, (index * 37) % 100));
        field.add_tag(tag);
    }

    let mut client = UhfClient::new(AnyUhfReader::Mock(reader), config)?;

    let seen: Arc<Mutex<BTreeMap<String, u32>>> = Arc::default();
    let tally = Arc::clone(&seen);
    client.on_tag_read(move |tag| {
        info!(epc = %tag.epc, tid = %tag.tid, user = %tag.user, rssi = %tag.signal_strength, "tag-read");
        if let Ok(mut seen) = tally.lock() {
            *seen.entry(tag.epc.clone()).or_default() += tag.read_count;
        }
    });
    client.on_inventory_start(|| info!("inventory-start"));
    client.on_inventory_stop(|| info!("inventory-stop"));
    client.on_trigger_press(|| info!("trigger-press"));
    client.on_trigger_release(|| info!("trigger-release"));

    let (keys, key_handle) = MockKeySource::new();
    client.attach_key_source(AnyKeySource::Mock(keys));

    client.init().await.context("initializing reader")?;
    info!("Firmware {}", client.get_version().await?);

    client
        .set_power(cli.power)
        .await
        .context("setting power")?;
    client.set_frequency_mode(cli.region).await?;
    let mode_set = match cli.mode {
        Mode::Epc => client.set_epc_mode().await?,
        Mode::EpcTid => client.set_epc_and_tid_mode().await?,
        Mode::EpcTidUser => client.set_epc_tid_user_mode(0, 2).await?,
    };
    if !mode_set {
        warn!("Reader rejected inventory mode {:?}", cli.mode);
    }
    info!(
        "Power {} dBm, region {} ({}), mode {:?}",
        client.get_power().await?,
        client.get_frequency_mode().await?,
        cli.region.band(),
        client.get_inventory_mode().await?
    );

    // Pull the trigger to start, release it when done
    if let Some(code) = trigger_code {
        key_handle.press(code).await?;
    }

    client.start_inventory().await?;
    for round in 1..=cli.rounds {
        let reported = field.run_inventory_round();
        info!("Round {}: {} report(s)", round, reported);
        tokio::time::sleep(ROUND_INTERVAL).await;
    }
    client.stop_inventory().await?;

    if let Some(code) = trigger_code {
        key_handle.release(code).await?;
    }

    match client.inventory_single_tag().await {
        Ok(tag) => {
            let tid = client
                .read_data("00000000", MemoryBank::Tid, 0, 4)
                .await
                .unwrap_or_default();
            info!("Single read: {} (TID {})", tag.epc, tid);
        }
        Err(e) => warn!("Single read failed: {} [{}]", e, e.code()),
    }

    client.flush_events().await;
    client.shutdown().await;

    let seen = seen.lock().map(|seen| seen.clone()).unwrap_or_default();
    info!(
        "{} unique tag(s), {} read(s), {} event(s) dropped",
        seen.len(),
        seen.values().sum::<u32>(),
        client.dropped_events()
    );

    Ok(())
}
