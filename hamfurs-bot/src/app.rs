//! Wires configuration, stores, sources and the chat transport together.

use crate::config::BotConfig;
use crate::module::alias::AliasStore;
use crate::module::callbook::acma::AcmaClient;
use crate::module::callbook::callook::CallookClient;
use crate::module::callbook::enrichment::Enrichment;
use crate::module::callbook::hamqth::HamQthClient;
use crate::module::callbook::ic::IcRecord;
use crate::module::callbook::nkom::NkomRecord;
use crate::module::callbook::{CachedCallbook, CallbookPipeline, CallbookSource, CallbookSources, Source};
use crate::module::glossary::Glossary;
use crate::module::greeter::Greeter;
use crate::module::handler::{HandlerSettings, MessageHandler};
use crate::module::scheduled::{ScheduledTaskConfig, ScheduledTaskManager};
use crate::poller::Poller;
use crate::reply::ReplyTracker;
use crate::store::{self, Collection, Reloadable};
use crate::telegram::TelegramClient;
use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

pub struct App {
    pub poller: Poller,
    pub tasks: ScheduledTaskManager,
}

async fn open<T>(config: &BotConfig, name: &str) -> anyhow::Result<Collection<T>>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    let path = config.collection_path(name);
    Collection::open(name, &path)
        .await
        .with_context(|| format!("Failed to open collection '{}'", name))
}

pub async fn build(config: &BotConfig) -> anyhow::Result<App> {
    let http = reqwest::Client::builder()
        .timeout(config.sources.request_timeout())
        .user_agent(concat!("hamfurs-bot/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let ic: Arc<Collection<IcRecord>> = Arc::new(open(config, store::IC).await?);
    let nkom: Arc<Collection<NkomRecord>> = Arc::new(open(config, store::NKOM).await?);
    let dmr = Arc::new(open(config, store::DMR).await?);
    let ve_sessions = Arc::new(open(config, store::VE_SESSIONS).await?);

    let hamqth = config.hamqth.as_ref().map(|account| {
        Arc::new(HamQthClient::new(
            http.clone(),
            config.sources.hamqth_url.clone(),
            account.username.clone(),
            account.password.clone(),
        )) as Arc<dyn CallbookSource>
    });
    if hamqth.is_none() {
        tracing::warn!("No HamQTH account configured, secondary lookups disabled");
    }

    let sources = CallbookSources {
        ic: Arc::new(CachedCallbook::new(Source::Ic, ic.clone())),
        nkom: Arc::new(CachedCallbook::new(Source::Nkom, nkom.clone())),
        acma: Arc::new(AcmaClient::new(http.clone(), config.sources.acma_url.clone())),
        callook: Arc::new(CallookClient::new(http.clone(), config.sources.callook_url.clone())),
        hamqth,
    };

    let aliases = Arc::new(AliasStore::new(open(config, store::ALIASES).await?));
    let enrichment = Arc::new(Enrichment::new(dmr.clone(), ve_sessions.clone()));
    let pipeline = Arc::new(CallbookPipeline::new(sources, aliases.clone(), enrichment));

    let telegram = Arc::new(
        TelegramClient::new(
            &config.telegram.api_base,
            &config.telegram.token,
            config.sources.request_timeout(),
        )
        .context("Failed to build Telegram client")?,
    );

    let handler = Arc::new(MessageHandler::new(
        telegram.clone(),
        pipeline,
        aliases,
        Arc::new(Glossary::new(open(config, store::DEFINITIONS).await?)),
        Arc::new(Greeter::new(open(config, store::CHATS).await?)),
        Arc::new(ReplyTracker::new(open(config, store::BOT_MESSAGES).await?)),
        HandlerSettings {
            home_chat_id: config.telegram.home_chat_id,
            owner_username: config.telegram.owner_username.clone(),
        },
    ));

    let caches: Vec<Arc<dyn Reloadable>> = vec![ic, nkom, dmr, ve_sessions];
    let tasks = ScheduledTaskManager::new(
        ScheduledTaskConfig {
            cache_reload_interval_minutes: config.cache.reload_interval_minutes,
            perform_initial_reload: false,
        },
        caches,
    );

    Ok(App {
        poller: Poller::new(telegram, handler, config.telegram.poll_timeout_secs),
        tasks,
    })
}
