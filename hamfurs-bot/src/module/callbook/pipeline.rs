//! Callsign resolution.
//!
//! A query is either a callsign or an `@handle`. Handles are resolved to a
//! callsign through the alias store first. The callsign is then classified:
//! Canadian, Norwegian and Australian callsigns go to their authoritative
//! callbook only, everything else goes to callook.info, then HamQTH, and
//! finally degrades to a structurally classified "unknown" record.

use super::enrichment::Enrichment;
use super::error::LookupError;
use super::source::CallbookSource;
use super::types::{CallbookRecord, UnknownCallsign};
use crate::module::alias::{Alias, AliasStore};
use hamfurs_common::{Callsign, ItuCountry, Jurisdiction, classify};
use std::sync::Arc;

/// Queries for this callsign are dropped without a reply.
pub const IGNORED_CALLSIGN: &str = "KA6BIM";

pub fn is_ignored(query: &str) -> bool {
    query.trim().eq_ignore_ascii_case(IGNORED_CALLSIGN)
}

pub struct CallbookSources {
    pub ic: Arc<dyn CallbookSource>,
    pub nkom: Arc<dyn CallbookSource>,
    pub acma: Arc<dyn CallbookSource>,
    pub callook: Arc<dyn CallbookSource>,
    /// Absent when no HamQTH account is configured
    pub hamqth: Option<Arc<dyn CallbookSource>>,
}

/// A record together with its decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub callsign: Callsign,
    pub record: CallbookRecord,
    pub alias: Option<Alias>,
    pub dmr_id: Option<u64>,
    pub ve_sessions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Ignored,
    Found(Resolved),
    Failed(LookupError),
}

pub struct CallbookPipeline {
    sources: CallbookSources,
    aliases: Arc<AliasStore>,
    enrichment: Arc<Enrichment>,
}

impl CallbookPipeline {
    pub fn new(sources: CallbookSources, aliases: Arc<AliasStore>, enrichment: Arc<Enrichment>) -> Self {
        Self {
            sources,
            aliases,
            enrichment,
        }
    }

    pub async fn resolve(&self, query: &str) -> Resolution {
        if is_ignored(query) {
            tracing::info!("Ignoring lookup for {}", query.trim());
            return Resolution::Ignored;
        }
        match self.resolve_query(query.trim()).await {
            Ok(resolved) => Resolution::Found(resolved),
            Err(e) => {
                match &e {
                    LookupError::Transient { .. } => tracing::warn!("Lookup of '{}' failed: {}", query, e),
                    _ => tracing::debug!("Lookup of '{}': {}", query, e),
                }
                Resolution::Failed(e)
            }
        }
    }

    async fn resolve_query(&self, query: &str) -> Result<Resolved, LookupError> {
        let (callsign, alias) = match query.strip_prefix('@') {
            Some(handle) => {
                let alias = self
                    .aliases
                    .by_handle(handle)
                    .await
                    .ok_or_else(|| LookupError::AliasNotFound {
                        handle: handle.to_string(),
                    })?;
                let callsign = Callsign::parse(&alias.callsign).map_err(|_| LookupError::Unclassified)?;
                (callsign, Some(alias))
            }
            None => {
                let callsign = Callsign::parse(query).map_err(|_| LookupError::Unclassified)?;
                let alias = self.aliases.by_callsign(&callsign).await;
                (callsign, alias)
            }
        };

        let dmr_id = self.enrichment.dmr_id(&callsign).await;

        let record = match classify(&callsign) {
            Jurisdiction::Ca => self.authoritative(&self.sources.ic, &callsign).await?,
            Jurisdiction::No => self.authoritative(&self.sources.nkom, &callsign).await?,
            Jurisdiction::Au => self.authoritative(&self.sources.acma, &callsign).await?,
            Jurisdiction::Us => {
                self.fallback_chain(&callsign, Some(ItuCountry::UnitedStates))
                    .await?
            }
            Jurisdiction::Other(country) => self.fallback_chain(&callsign, Some(country)).await?,
            Jurisdiction::Unclassified => self.fallback_chain(&callsign, None).await?,
        };

        let ve_sessions = match record {
            CallbookRecord::Us(_) => self.enrichment.ve_sessions(&callsign).await,
            _ => None,
        };

        Ok(Resolved {
            callsign,
            record,
            alias,
            dmr_id,
            ve_sessions,
        })
    }

    async fn authoritative(
        &self,
        source: &Arc<dyn CallbookSource>,
        callsign: &Callsign,
    ) -> Result<CallbookRecord, LookupError> {
        source
            .lookup(callsign)
            .await?
            .ok_or(LookupError::NotFound {
                origin: source.source(),
            })
    }

    async fn fallback_chain(
        &self,
        callsign: &Callsign,
        country: Option<ItuCountry>,
    ) -> Result<CallbookRecord, LookupError> {
        if let Some(record) = self.sources.callook.lookup(callsign).await? {
            return Ok(record);
        }

        if let Some(hamqth) = &self.sources.hamqth {
            match hamqth.lookup(callsign).await {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => tracing::debug!("{} not found in HamQTH", callsign),
                Err(e) => tracing::warn!("HamQTH lookup for {} failed: {}", callsign, e),
            }
        }

        Ok(CallbookRecord::Unknown(UnknownCallsign {
            callsign: callsign.to_string(),
            country,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::callbook::acma::AcmaLicense;
    use crate::module::callbook::callook::UsLicense;
    use crate::module::callbook::enrichment::{DmrUser, VeSessionCount};
    use crate::module::callbook::hamqth::HamQthRecord;
    use crate::module::callbook::ic::IcRecord;
    use crate::module::callbook::nkom::NkomRecord;
    use crate::module::callbook::types::Source;
    use crate::store::Collection;
    use crate::testing::{StaticSource, user};

    struct Fixture {
        pipeline: CallbookPipeline,
        aliases: Arc<AliasStore>,
        ic: Arc<StaticSource>,
        nkom: Arc<StaticSource>,
        acma: Arc<StaticSource>,
        callook: Arc<StaticSource>,
        hamqth: Arc<StaticSource>,
    }

    fn fixture() -> Fixture {
        let ic = Arc::new(StaticSource::new(Source::Ic));
        let nkom = Arc::new(StaticSource::new(Source::Nkom));
        let acma = Arc::new(StaticSource::new(Source::Acma));
        let callook = Arc::new(StaticSource::new(Source::Callook));
        let hamqth = Arc::new(StaticSource::new(Source::HamQth));

        ic.insert(
            "VE3FXY",
            CallbookRecord::Ca(IcRecord {
                callsign: "VE3FXY".into(),
                name: "Jean".into(),
                ..Default::default()
            }),
        );
        for callsign in ["LA1ABC", "3Y0J"] {
            nkom.insert(
                callsign,
                CallbookRecord::No(NkomRecord {
                    callsign: callsign.into(),
                    name: "Kari".into(),
                    ..Default::default()
                }),
            );
        }
        for callsign in ["VK2ABC", "AX2ABC"] {
            acma.insert(
                callsign,
                CallbookRecord::Au(AcmaLicense {
                    callsign: callsign.into(),
                    name: "Bruce".into(),
                    ..Default::default()
                }),
            );
        }
        callook.insert(
            "KF3RRY",
            CallbookRecord::Us(UsLicense {
                status: "VALID".into(),
                name: "TERRY HAM".into(),
                ..Default::default()
            }),
        );
        hamqth.insert(
            "OK1RR",
            CallbookRecord::HamQth(HamQthRecord {
                callsign: "OK1RR".into(),
                ..Default::default()
            }),
        );

        let aliases = Arc::new(AliasStore::new(Collection::in_memory("aliases")));
        let dmr = Collection::from_docs(
            "dmr",
            [("KF3RRY".to_string(), DmrUser { radio_id: 3142001, ..Default::default() })],
        );
        let ve = Collection::from_docs(
            "ve_sessions",
            [
                ("KF3RRY".to_string(), VeSessionCount { count: 12, ..Default::default() }),
                ("VE3FXY".to_string(), VeSessionCount { count: 99, ..Default::default() }),
            ],
        );
        let enrichment = Arc::new(Enrichment::new(Arc::new(dmr), Arc::new(ve)));

        let sources = CallbookSources {
            ic: ic.clone(),
            nkom: nkom.clone(),
            acma: acma.clone(),
            callook: callook.clone(),
            hamqth: Some(hamqth.clone()),
        };
        Fixture {
            pipeline: CallbookPipeline::new(sources, aliases.clone(), enrichment),
            aliases,
            ic,
            nkom,
            acma,
            callook,
            hamqth,
        }
    }

    fn found(resolution: Resolution) -> Resolved {
        match resolution {
            Resolution::Found(resolved) => resolved,
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sentinel_is_ignored() {
        let f = fixture();
        assert_eq!(f.pipeline.resolve(" ka6bim ").await, Resolution::Ignored);
        assert_eq!(f.callook.calls(), 0);
    }

    #[tokio::test]
    async fn test_us_record_with_enrichment() {
        let f = fixture();
        let resolved = found(f.pipeline.resolve("kf3rry").await);
        assert!(matches!(resolved.record, CallbookRecord::Us(_)));
        assert_eq!(resolved.dmr_id, Some(3142001));
        assert_eq!(resolved.ve_sessions, Some(12));
        assert_eq!(f.hamqth.calls(), 0);
    }

    #[tokio::test]
    async fn test_fast_path_consults_only_authoritative_source() {
        let f = fixture();
        let resolved = found(f.pipeline.resolve("VE3FXY").await);
        assert!(matches!(resolved.record, CallbookRecord::Ca(_)));
        // VE counts only decorate US records
        assert_eq!(resolved.ve_sessions, None);

        let miss = f.pipeline.resolve("VA3ZZZ").await;
        assert_eq!(miss, Resolution::Failed(LookupError::NotFound { origin: Source::Ic }));
        assert_eq!(f.ic.calls(), 2);
        assert_eq!(f.nkom.calls(), 0);
        assert_eq!(f.acma.calls(), 0);
        assert_eq!(f.callook.calls(), 0);
        assert_eq!(f.hamqth.calls(), 0);
    }

    #[tokio::test]
    async fn test_norway_routes_only_to_nkom() {
        let f = fixture();
        for callsign in ["LA1ABC", "3y0j"] {
            let resolved = found(f.pipeline.resolve(callsign).await);
            assert!(matches!(resolved.record, CallbookRecord::No(_)));
        }

        let miss = f.pipeline.resolve("LB9ZZZ").await;
        assert_eq!(miss, Resolution::Failed(LookupError::NotFound { origin: Source::Nkom }));
        assert_eq!(f.nkom.calls(), 3);
        assert_eq!(f.ic.calls(), 0);
        assert_eq!(f.acma.calls(), 0);
        assert_eq!(f.callook.calls(), 0);
        assert_eq!(f.hamqth.calls(), 0);
    }

    #[tokio::test]
    async fn test_australia_routes_only_to_acma() {
        let f = fixture();
        for callsign in ["VK2ABC", "ax2abc"] {
            let resolved = found(f.pipeline.resolve(callsign).await);
            assert!(matches!(resolved.record, CallbookRecord::Au(_)));
        }

        let miss = f.pipeline.resolve("VK3ZZZ").await;
        assert_eq!(miss, Resolution::Failed(LookupError::NotFound { origin: Source::Acma }));
        assert_eq!(f.acma.calls(), 3);
        assert_eq!(f.ic.calls(), 0);
        assert_eq!(f.nkom.calls(), 0);
        assert_eq!(f.callook.calls(), 0);
        assert_eq!(f.hamqth.calls(), 0);
    }

    #[tokio::test]
    async fn test_secondary_lookup() {
        let f = fixture();
        let resolved = found(f.pipeline.resolve("OK1RR").await);
        assert!(matches!(resolved.record, CallbookRecord::HamQth(_)));
        assert_eq!(f.callook.calls(), 1);
        assert_eq!(f.hamqth.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_everywhere() {
        let f = fixture();
        let resolved = found(f.pipeline.resolve("ZZ1ZZZ").await);
        assert_eq!(
            resolved.record,
            CallbookRecord::Unknown(UnknownCallsign {
                callsign: "ZZ1ZZZ".into(),
                country: None
            })
        );

        let resolved = found(f.pipeline.resolve("G4ABC").await);
        assert_eq!(
            resolved.record,
            CallbookRecord::Unknown(UnknownCallsign {
                callsign: "G4ABC".into(),
                country: Some(ItuCountry::UnitedKingdom)
            })
        );
    }

    #[tokio::test]
    async fn test_secondary_failure_degrades_to_unknown() {
        let f = fixture();
        f.hamqth.fail_with(LookupError::transient(Source::HamQth, "down"));
        let resolved = found(f.pipeline.resolve("G4ABC").await);
        assert!(matches!(resolved.record, CallbookRecord::Unknown(_)));
    }

    #[tokio::test]
    async fn test_primary_failure_is_transient() {
        let f = fixture();
        f.callook.fail_with(LookupError::transient(Source::Callook, "HTTP 502"));
        assert!(matches!(
            f.pipeline.resolve("KF3RRY").await,
            Resolution::Failed(LookupError::Transient { origin: Source::Callook, .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_lookup_merges_alias() {
        let f = fixture();
        let terry = user(5, "Terry", Some("Terry_Fox"));
        f.aliases
            .register(&terry, &Callsign::parse("KF3RRY").unwrap(), 1)
            .await
            .unwrap();

        let resolved = found(f.pipeline.resolve("@terry_fox").await);
        assert_eq!(resolved.callsign.as_str(), "KF3RRY");
        assert_eq!(resolved.alias.as_ref().unwrap().user_id, 5);

        // Plain callsign queries carry the alias too
        let resolved = found(f.pipeline.resolve("KF3RRY").await);
        assert!(resolved.alias.is_some());

        assert_eq!(
            f.pipeline.resolve("@nobody").await,
            Resolution::Failed(LookupError::AliasNotFound { handle: "nobody".into() })
        );
    }

    #[tokio::test]
    async fn test_malformed_query_is_unclassified() {
        let f = fixture();
        assert_eq!(
            f.pipeline.resolve("not a callsign").await,
            Resolution::Failed(LookupError::Unclassified)
        );
        assert_eq!(f.callook.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let f = fixture();
        let first = f.pipeline.resolve("KF3RRY").await;
        let second = f.pipeline.resolve("KF3RRY").await;
        assert_eq!(first, second);
    }
}
