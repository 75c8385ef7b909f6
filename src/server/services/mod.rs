pub mod app_services;
pub mod relay_services;

pub use app_services::AppServices;
pub use relay_services::{DynUpstreamFetcher, ReqwestFetcher, StreamRelay, UpstreamFetcher};
