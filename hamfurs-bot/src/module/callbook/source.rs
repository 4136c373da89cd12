use super::error::LookupError;
use super::types::{CallbookRecord, Source};
use crate::store::Collection;
use async_trait::async_trait;
use hamfurs_common::Callsign;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// A single callbook. `Ok(None)` is a plain miss.
#[async_trait]
pub trait CallbookSource: Send + Sync {
    fn source(&self) -> Source;

    async fn lookup(&self, callsign: &Callsign) -> Result<Option<CallbookRecord>, LookupError>;
}

/// Callbook served from a locally imported collection keyed by callsign.
pub struct CachedCallbook<T> {
    source: Source,
    records: Arc<Collection<T>>,
}

impl<T> CachedCallbook<T> {
    pub fn new(source: Source, records: Arc<Collection<T>>) -> Self {
        Self { source, records }
    }
}

#[async_trait]
impl<T> CallbookSource for CachedCallbook<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + Into<CallbookRecord> + 'static,
{
    fn source(&self) -> Source {
        self.source
    }

    async fn lookup(&self, callsign: &Callsign) -> Result<Option<CallbookRecord>, LookupError> {
        Ok(self.records.get(callsign.as_str()).await.map(Into::into))
    }
}
