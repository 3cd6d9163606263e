//! Core type definitions for the PushLink device SDK.
//!
//! This crate defines the plain data types shared across the SDK:
//! - Inbound push payloads (`ToastPush`) and their query-string parsing
//! - Tag values and backend tag diagnostics
//! - Geozone positions
//! - The request/response wire envelopes and their status convention
//!
//! Everything here is I/O-free; the protocol layer and the SDK proper live
//! in `pushlink-proto` and `pushlink-sdk`.

mod envelope;
mod geo;
mod push;
mod tags;

pub use envelope::{RequestEnvelope, ResponseEnvelope, STATUS_OK, STATUS_PARTIAL};
pub use geo::GeoPosition;
pub use push::ToastPush;
pub use tags::{SkippedTag, TagValue};
