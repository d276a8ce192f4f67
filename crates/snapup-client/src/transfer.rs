//! End-to-end transfer: locate, negotiate, keep alive, upload, tear down.
//!
//! All failures surface as a [`SnapError`] from [`Uploader::transfer`]; the
//! session cache is updated on the way according to which step failed.

use std::path::Path;
use std::sync::Arc;

use snapup_core::{SnapError, SnapResult};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{self, ApplianceApi};
use crate::cache::{CacheKey, SessionCache};
use crate::config::UploaderConfig;
use crate::discovery::{BroadcastLocator, Locator};
use crate::keepalive::KeepAlive;
use crate::negotiator::Negotiator;
use crate::payload::Payload;
use crate::report::{NoopReporter, Reporter, TransferEvent};

/// Summary of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub address: String,
    pub file_name: String,
    pub size: u64,
}

/// Owns everything one upload run needs.
pub struct Uploader {
    config: UploaderConfig,
    http: reqwest::Client,
    cache: SessionCache,
    locator: Box<dyn Locator>,
    reporter: Arc<dyn Reporter>,
    keepalive: KeepAlive,
    cancel: CancellationToken,
}

impl Uploader {
    pub fn new(config: UploaderConfig) -> SnapResult<Self> {
        let http = api::http_client()?;
        let cache = SessionCache::new(&config.cache_dir);
        let locator = Box::new(BroadcastLocator::new(
            config.discovery_port,
            config.discovery_timeout,
        ));

        Ok(Self {
            config,
            http,
            cache,
            locator,
            reporter: Arc::new(NoopReporter),
            keepalive: KeepAlive::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_locator(mut self, locator: impl Locator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Token that aborts a pending approval wait when cancelled.
    ///
    /// Cancellation applies to the running or next transfer only; once that
    /// transfer returns, a fresh token is issued and must be fetched again.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_keepalive_running(&self) -> bool {
        self.keepalive.is_running()
    }

    /// Upload the file at `path` to `address`, or to the cached or
    /// discovered appliance when no address is given.
    pub async fn transfer(&mut self, path: &Path, address: Option<&str>) -> SnapResult<TransferReport> {
        let result = self.run(path, address).await;
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        result
    }

    async fn run(&mut self, path: &Path, address: Option<&str>) -> SnapResult<TransferReport> {
        let payload = Payload::open(path).await?;
        let address = self.resolve_address(address).await?;
        let api = ApplianceApi::new(
            self.http.clone(),
            address.as_str(),
            self.config.http_port,
            self.config.request_timeout,
        );

        let candidate = self.cache.read(CacheKey::LastToken);
        let negotiated = Negotiator::new(&api, &self.cache, self.reporter.as_ref())
            .poll_interval(self.config.poll_interval)
            .max_polls(self.config.max_polls)
            .cancel_token(self.cancel.clone())
            .negotiate(candidate.as_deref())
            .await;

        let session = match negotiated {
            Ok(session) => session,
            Err(e) => {
                if e.clears_cached_token() {
                    if let Err(ce) = self.cache.clear(CacheKey::LastToken) {
                        warn!(error = %ce, "failed to clear cached token");
                    }
                }
                return Err(e);
            }
        };
        self.reporter.report(&TransferEvent::Authorized {
            address: session.address.clone(),
            token: session.token.clone(),
        });

        self.keepalive.start(
            api.clone(),
            session.token.clone(),
            self.config.keepalive_interval,
        );
        self.reporter.report(&TransferEvent::Uploading {
            file_name: payload.file_name.clone(),
            size: payload.size,
        });
        let submitted = api
            .upload(&session.token, &payload, self.config.upload_timeout)
            .await;
        self.keepalive.stop().await;
        submitted?;

        api.disconnect(&session.token).await;
        if let Err(e) = self.cache.write(CacheKey::LastAddress, &address) {
            warn!(error = %e, "failed to cache appliance address");
        }

        info!(address = %address, file = %payload.file_name, size = payload.size, "upload finished");
        self.reporter.report(&TransferEvent::Uploaded);
        Ok(TransferReport {
            address,
            file_name: payload.file_name,
            size: payload.size,
        })
    }

    /// Explicit address, else the cached one (consumed), else discovery.
    async fn resolve_address(&self, explicit: Option<&str>) -> SnapResult<String> {
        if let Some(address) = explicit.map(str::trim).filter(|a| !a.is_empty()) {
            return Ok(address.to_string());
        }

        if let Some(cached) = self.cache.take(CacheKey::LastAddress) {
            self.reporter
                .report(&TransferEvent::UsingCachedAddress(cached.clone()));
            return Ok(cached);
        }

        self.reporter.report(&TransferEvent::Discovering);
        let mut found = self.locator.locate().await?;
        match found.len() {
            0 => Err(SnapError::NoApplianceFound),
            1 => {
                let appliance = found.remove(0);
                self.reporter
                    .report(&TransferEvent::Discovered(appliance.clone()));
                Ok(appliance.address)
            }
            _ => Err(SnapError::AmbiguousTarget(found)),
        }
    }
}
