//! Wire protocol layer for the PushLink device SDK.
//!
//! Two pieces:
//! - **Codec**: wraps request payloads in the `{"request": ...}` envelope and
//!   decodes the `{status_code, status_message, response}` reply, applying
//!   the 200/103-means-success convention.
//! - **Client**: one fire-and-forget HTTP exchange per call over reqwest.
//!   Each call resolves exactly once; there are no retries and no
//!   cancellation.

mod client;
mod codec;
mod error;

pub use client::RequestClient;
pub use codec::{decode, encode};
pub use error::{ProtoError, ProtoResult};
