//! Remote package sources and the two network-facing steps of acquisition:
//! resolving which version to use and downloading its archive.
//!
//! Transport is hidden behind [`HttpClient`]; the protocol behind [`PackageSource`].
//! Both are traits so that tests can run without a network.

pub use config::{DEFAULT_SOURCE_URL, SourceConfig, SourceEntry};
pub use download::download;
pub use error::{Error, Result};
pub use http::{BoxStream, HttpClient, HttpResponse, read_body};
#[cfg(feature = "reqwest")]
pub use http::reqwest_impl::ReqwestClient;
pub use nuget::NuGetV3Source;
pub use resolve::resolve_version;
pub use source::PackageSource;

mod config;
mod download;
mod error;
mod http;
mod nuget;
mod resolve;
mod source;
