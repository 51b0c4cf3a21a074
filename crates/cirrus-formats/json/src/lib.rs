//! # Cirrus JSON Format
//!
//! Structured-mode JSON encoding for CloudEvents
//! (`application/cloudevents+json`).
//!
//! ## Overview
//!
//! A structured event is one JSON object whose members are the event's
//! attributes, named per spec version, plus the payload under `data` (or
//! `data_base64` for raw bytes in 1.0):
//!
//! ```text
//! {
//!   "specversion": "1.0",
//!   "type": "com.example.test",
//!   "source": "https://example.com/src",
//!   "id": "A1",
//!   "time": "2018-04-05T17:31:00Z",
//!   "datacontenttype": "text/xml",
//!   "data": "<x/>",
//!   "comexampleextension1": "value"
//! }
//! ```
//!
//! ## Payload Types
//!
//! A [`JsonFormatter<T>`] is bound to one payload type. The `data` member is
//! deserialized into `T`, and payloads of type `Vec<u8>`, `String` and
//! `serde_json::Value` are stored as the matching [`Data`](cirrus_core::Data)
//! variant:
//!
//! ```rust,ignore
//! use cirrus_format_json::JsonFormatter;
//! use cirrus_core::EventFormatter;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Order { id: u32 }
//!
//! let formatter = JsonFormatter::<Order>::new();
//! let event = formatter.decode_structured(body, &[])?;
//! let order: &Order = event.data().and_then(|d| d.downcast_ref()).unwrap();
//! ```

mod attribute;
mod formatter;
mod reader;
mod structured;

pub use formatter::{JSON_MEDIA_TYPE, JsonFormatter, JsonPayload};
pub use structured::DATA_BASE64;
