pub mod http;
pub mod registry;

pub use http::HttpFetcher;
pub use registry::ProviderRegistry;
