pub mod adapter;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod page;
mod retry;
pub mod sink;
pub mod static_page;
pub mod strategy;

pub use adapter::SiteAdapter;
pub use error::{
    NoStrategySucceeded, NormalizationError, PageError, SinkError, StrategyFailure,
    StrategyFailureKind,
};
pub use normalize::{normalize, unit_price};
pub use orchestrator::Orchestrator;
pub use page::{BrowserSession, PageHandle};
pub use sink::{JsonSink, ReportSink, TextSink};
pub use static_page::{StaticPage, StaticSession};
pub use strategy::{resolve, RawExtraction};
