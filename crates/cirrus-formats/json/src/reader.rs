//! Decoding from blocking and async readers.

use std::io::Read;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use cirrus_core::{BoxedExtension, CloudEvent, CloudEventResult};

use crate::formatter::{JsonFormatter, JsonPayload};

impl<T: JsonPayload> JsonFormatter<T> {
    /// Decodes a structured document from a blocking reader.
    ///
    /// The reader is consumed to the end of the document.
    pub fn decode_structured_reader<R: Read>(
        &self,
        reader: R,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let document: Value = serde_json::from_reader(reader)?;
        self.decode_value(document, extensions)
    }

    /// Decodes a structured document from an async reader.
    ///
    /// Only buffering the input awaits; decoding runs the same algorithm as
    /// the synchronous entry points once the whole document is read.
    pub async fn decode_structured_async<R>(
        &self,
        mut reader: R,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent>
    where
        R: AsyncRead + Unpin,
    {
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        self.decode(&body, extensions)
    }
}
