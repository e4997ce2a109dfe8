use crate::client::providers::{NyaaProvider, SourceError, SourceProvider, TouchGalProvider};
use crate::client::HttpClientConfig;
use crate::models::{Game, Resource};
use crate::ranking::{rank, Category, RankedResources};
use crate::Config;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Configuration for aggregated search behaviour
#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    /// Deadline for each source; `None` waits for every source however long it takes
    pub source_timeout: Option<Duration>,
}

/// Outcome of one aggregated search, including which sources failed
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Games from every successful source, in registration order
    pub games: Vec<Game>,
    /// Sources that answered
    pub succeeded: Vec<String>,
    /// Sources that failed, with the reason
    pub failures: Vec<(String, SourceError)>,
    /// Wall-clock time of the whole fan-out
    pub elapsed: Duration,
}

impl SearchReport {
    fn empty() -> Self {
        Self {
            games: Vec::new(),
            succeeded: Vec::new(),
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// True when at least one source was queried and none of them answered
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failures.is_empty()
    }
}

/// Fans a keyword out to every registered source and routes resource lookups
/// back to the source that produced a game.
pub struct AggregatedSearch {
    providers: Vec<Arc<dyn SourceProvider>>,
    config: AggregatorConfig,
    cancellation_token: CancellationToken,
}

impl Default for AggregatedSearch {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl AggregatedSearch {
    /// Create an aggregator with no sources
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            providers: Vec::new(),
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Create an aggregator with the enabled built-in sources: TouchGal, then Nyaa
    pub fn from_config(app_config: &Config) -> Result<Self, SourceError> {
        let http = HttpClientConfig::from(&app_config.http);
        let mut aggregator = Self::new(AggregatorConfig {
            source_timeout: app_config.search.source_timeout(),
        });

        if app_config.touchgal.enabled {
            aggregator.register(Arc::new(TouchGalProvider::new(&app_config.touchgal, &http)?));
        }
        if app_config.nyaa.enabled {
            aggregator.register(Arc::new(NyaaProvider::new(&app_config.nyaa, &http)?));
        }

        info!(
            "Initialized aggregated search with {} sources",
            aggregator.providers.len()
        );
        Ok(aggregator)
    }

    /// Append a source. Names must be unique; the first match wins when routing.
    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) {
        if self.providers.iter().any(|p| p.name() == provider.name()) {
            warn!("Source {} is registered more than once", provider.name());
        }
        self.providers.push(provider);
    }

    /// Names of the registered sources, in registration order
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// `(name, description)` of every registered source
    #[must_use]
    pub fn provider_descriptions(&self) -> Vec<(String, String)> {
        self.providers
            .iter()
            .map(|p| (p.name().to_string(), p.description().to_string()))
            .collect()
    }

    /// Token that aborts in-flight and later searches once cancelled
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Search every source and concatenate their games.
    ///
    /// Failed sources contribute nothing; see [`Self::search_all_with_report`]
    /// to find out which ones failed.
    pub async fn search_all(&self, keyword: &str) -> Vec<Game> {
        self.search_all_with_report(keyword).await.games
    }

    /// Search every source concurrently and wait for all of them to settle.
    ///
    /// Results are concatenated in registration order regardless of which
    /// source finished first. A blank keyword queries nothing.
    pub async fn search_all_with_report(&self, keyword: &str) -> SearchReport {
        if keyword.trim().is_empty() {
            debug!("Ignoring blank search keyword");
            return SearchReport::empty();
        }

        let start_time = Instant::now();
        info!(
            "Starting aggregated search for: {} across {} sources",
            keyword,
            self.providers.len()
        );

        let token = self.cancellation_token.child_token();
        let tasks = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let keyword = keyword.to_string();
            let token = token.clone();
            let source_timeout = self.config.source_timeout;

            tokio::spawn(async move {
                tokio::select! {
                    () = token.cancelled() => Err(SourceError::Cancelled),
                    result = with_deadline(provider.search(&keyword), source_timeout) => result,
                }
            })
        });

        let outcomes = join_all(tasks).await;

        let mut report = SearchReport::empty();
        for (provider, outcome) in self.providers.iter().zip(outcomes) {
            let name = provider.name().to_string();
            let result = outcome.unwrap_or_else(|e| {
                error!("Search task for {} failed: {}", name, e);
                Err(SourceError::Unavailable(format!("search task failed: {e}")))
            });

            match result {
                Ok(games) => {
                    info!("Source {} returned {} games", name, games.len());
                    report.games.extend(games);
                    report.succeeded.push(name);
                }
                Err(err) => {
                    warn!("Source {} failed: {}", name, err);
                    report.failures.push((name, err));
                }
            }
        }
        report.elapsed = start_time.elapsed();

        info!(
            "Aggregated search completed: {} games from {} sources ({} failed) in {:?}",
            report.games.len(),
            report.succeeded.len(),
            report.failures.len(),
            report.elapsed
        );
        report
    }

    /// Fetch the resources of `game` from the source that produced it
    pub async fn resolve(&self, game: &Game) -> Result<Vec<Resource>, SourceError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name() == game.source)
            .ok_or_else(|| {
                warn!("No source registered under {}", game.source);
                SourceError::NotFound(game.source.clone())
            })?;

        debug!("Resolving {} via {}", game.id, provider.name());
        provider.resolve(&game.id).await
    }

    /// Resolve `game` and rank its resources for `category`
    pub async fn resolve_ranked(
        &self,
        game: &Game,
        category: Category,
    ) -> Result<RankedResources, SourceError> {
        let resources = self.resolve(game).await?;
        Ok(rank(resources, category))
    }
}

async fn with_deadline<F>(search: F, deadline: Option<Duration>) -> Result<Vec<Game>, SourceError>
where
    F: Future<Output = Result<Vec<Game>, SourceError>>,
{
    match deadline {
        Some(duration) => timeout(duration, search)
            .await
            .unwrap_or(Err(SourceError::Timeout(duration))),
        None => search.await,
    }
}
