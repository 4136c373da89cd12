//! hamfurs-import: turns downloaded callbook dumps into the collections the
//! bot serves lookups from.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hamfurs_bot::config::BotConfig;
use hamfurs_bot::module::callbook::enrichment::{
    DmrUser, VeSessionCount, parse_radioid_users, parse_ve_session_page,
};
use hamfurs_bot::module::callbook::ic::{IcRecord, parse_ic_csv};
use hamfurs_bot::module::callbook::nkom::{NkomRecord, parse_nkom_csv};
use hamfurs_bot::module::glossary::{Definition, parse_qcodes};
use hamfurs_bot::store::{self, Collection};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hamfurs-import")]
#[command(about = "Import callbook dumps into the bot's local collections")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "HAMFURS_CONFIG", default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Industry Canada amateur database (semicolon separated, ISO-8859-14)
    Ic { file: PathBuf },
    /// Nkom amateur licence list (semicolon separated, CP865)
    Nkom { file: PathBuf },
    /// radioid.net users.json
    Dmr { file: PathBuf },
    /// Saved ARRL VE session count page for one state
    Ve { file: PathBuf, state: String },
    /// Q-code list seeding the glossary
    Qcodes { file: PathBuf },
}

trait Keyed {
    fn key(&self) -> String;
}

impl Keyed for IcRecord {
    fn key(&self) -> String {
        self.callsign.clone()
    }
}

impl Keyed for NkomRecord {
    fn key(&self) -> String {
        self.callsign.clone()
    }
}

impl Keyed for DmrUser {
    fn key(&self) -> String {
        self.callsign.clone()
    }
}

impl Keyed for VeSessionCount {
    fn key(&self) -> String {
        self.callsign.clone()
    }
}

impl Keyed for Definition {
    fn key(&self) -> String {
        self.index.clone()
    }
}

/// Key records, keeping the first occurrence of a duplicated key.
fn keyed<T: Keyed>(records: Vec<T>) -> BTreeMap<String, T> {
    let mut docs = BTreeMap::new();
    for record in records {
        docs.entry(record.key()).or_insert(record);
    }
    docs
}

/// Replace one state's VE counts, leaving the other states alone.
fn merge_ve_sessions(docs: &mut BTreeMap<String, VeSessionCount>, state: &str, counts: Vec<VeSessionCount>) {
    docs.retain(|_, ve| ve.state != state);
    for count in counts {
        docs.insert(count.key(), count);
    }
}

async fn open<T>(config: &BotConfig, name: &str) -> Result<Collection<T>>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    Collection::open(name, config.collection_path(name))
        .await
        .with_context(|| format!("Failed to open collection '{}'", name))
}

async fn replace<T>(config: &BotConfig, name: &str, records: Vec<T>) -> Result<usize>
where
    T: Keyed + Clone + Serialize + DeserializeOwned + Send + Sync,
{
    let docs = keyed(records);
    let count = docs.len();
    open::<T>(config, name).await?.replace_all(docs).await?;
    Ok(count)
}

async fn read(file: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hamfurs_bot=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = BotConfig::from_file(&cli.config)?;
    let now = chrono::Utc::now().timestamp();

    let (name, count) = match cli.command {
        Command::Ic { file } => {
            let records = parse_ic_csv(&read(&file).await?, now)?;
            (store::IC, replace(&config, store::IC, records).await?)
        }
        Command::Nkom { file } => {
            let records = parse_nkom_csv(&read(&file).await?, now)?;
            (store::NKOM, replace(&config, store::NKOM, records).await?)
        }
        Command::Dmr { file } => {
            let json = String::from_utf8(read(&file).await?).context("radioid.net dump is not UTF-8")?;
            (store::DMR, replace(&config, store::DMR, parse_radioid_users(&json)?).await?)
        }
        Command::Ve { file, state } => {
            let html = String::from_utf8_lossy(&read(&file).await?).into_owned();
            let counts = parse_ve_session_page(&html, &state, now)?;
            let imported = counts.len();
            let collection = open::<VeSessionCount>(&config, store::VE_SESSIONS).await?;
            collection
                .update(|docs| merge_ve_sessions(docs, &state, counts))
                .await?;
            (store::VE_SESSIONS, imported)
        }
        Command::Qcodes { file } => {
            let json = String::from_utf8(read(&file).await?).context("Q-code list is not UTF-8")?;
            let definitions = keyed(parse_qcodes(&json)?);
            let imported = definitions.len();
            let collection = open::<Definition>(&config, store::DEFINITIONS).await?;
            collection
                .update(|docs| docs.extend(definitions))
                .await?;
            (store::DEFINITIONS, imported)
        }
    };

    tracing::info!("Imported {} records into '{}'", count, name);
    println!("{}: {} records", name, count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ve(callsign: &str, state: &str, count: u32) -> VeSessionCount {
        VeSessionCount {
            callsign: callsign.into(),
            state: state.into(),
            count,
            ..Default::default()
        }
    }

    #[test]
    fn test_keyed_keeps_first_duplicate() {
        let docs = keyed(vec![ve("KF3RRY", "PA", 1), ve("KF3RRY", "PA", 2), ve("W1AW", "CT", 3)]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs["KF3RRY"].count, 1);
    }

    #[test]
    fn test_merge_replaces_only_one_state() {
        let mut docs = keyed(vec![ve("KF3RRY", "PA", 1), ve("W1AW", "CT", 3), ve("N3XYZ", "PA", 4)]);
        merge_ve_sessions(&mut docs, "PA", vec![ve("KF3RRY", "PA", 10)]);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs["KF3RRY"].count, 10);
        assert_eq!(docs["W1AW"].count, 3);
        assert!(!docs.contains_key("N3XYZ"));
    }
}
