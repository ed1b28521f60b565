/*
[INPUT]:  HTTP client configuration and marketplace endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod tx;

pub use client::{ClientConfig, Hook, PorticoClient, UploadPart};
pub use error::{PorticoError, Result};
pub use tx::{SignedTx, sign_prepared};
