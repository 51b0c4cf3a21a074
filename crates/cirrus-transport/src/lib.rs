//! # Cirrus Transport
//!
//! Moves CloudEvents onto and off transport messages.
//!
//! A [`TransportMessage`] is the transport-neutral shape of a queue or topic
//! message: a body, a content type, a message id and a map of user
//! properties. [`MessageCodec`] converts between it and [`CloudEvent`] in
//! either content mode.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Application        │  (builds / consumes CloudEvents)
//! ├─────────────────────┤
//! │  cirrus-transport   │  <- This crate (message mapping)
//! ├─────────────────────┤
//! │  cirrus-core        │  (BinaryMapper, EventFormatter)
//! │  cirrus-format-json │
//! ├─────────────────────┤
//! │  Broker client      │  (sends / receives the message)
//! └─────────────────────┘
//! ```
//!
//! ## Content Modes
//!
//! | Mode | Body | Content type | Properties |
//! |------|------|--------------|------------|
//! | Structured | whole event document | `application/cloudevents+json` | prefixed attributes |
//! | Binary | event data | the event's `datacontenttype` | prefixed attributes |
//!
//! In both modes the event id travels as the message id and is not written
//! as a property.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cirrus_core::ContentMode;
//! use cirrus_transport::{MessageCodec, MessageExt};
//!
//! let codec = MessageCodec::new();
//! let message = codec.to_message(&event, ContentMode::Binary)?;
//!
//! if message.is_cloud_event() {
//!     let received = codec.to_cloud_event(&message, &[])?;
//! }
//! ```
//!
//! [`CloudEvent`]: cirrus_core::CloudEvent

mod codec;
mod message;

pub use codec::MessageCodec;
pub use message::{MessageExt, TransportMessage};
