pub mod discogs;
pub mod error;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use discogs::{DiscogsClient, PageEnvelope};
pub use error::DiscogsError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
