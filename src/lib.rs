pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod ranking;

pub use client::{
    AggregatedSearch, AggregatorConfig, HttpClientConfig, NyaaProvider, SearchReport, SourceError,
    SourceErrorKind, SourceProvider, TouchGalProvider,
};
pub use crate::config::{Config, ConfigOverrides};
pub use error::{Error, ErrorCategory, Result};
pub use models::{FieldValue, Game, Resource};
pub use ranking::{rank, rank_resources, score, Category, RankedResources};
