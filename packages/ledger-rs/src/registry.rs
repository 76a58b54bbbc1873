//! Registry and codec for turning stored envelopes back into commands.
//!
//! # Overview
//!
//! Every log row holds a JSON envelope:
//!
//! ```text
//! {"type": "PostComment", "message": {"parent": "post-1/0", "content": "reply", ...}}
//! ```
//!
//! Encoding goes through the command's own `Serialize` impl. Decoding goes
//! through a [`CommandRegistry`] instance built at startup: `type` picks the
//! decoder, `message` is handed to it. The registry is an explicit value
//! threaded into the codec, so two logs in the same process (or two tests)
//! never share hidden state.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = CommandRegistry::new();
//! registry
//!     .register::<()>("Skip", |()| Command::Skip)
//!     .register::<PostLink>("PostLink", Command::PostLink);
//!
//! let codec = JsonCodec::new(Arc::new(registry));
//! let raw = codec.encode(&Command::PostLink(post))?;
//! let back = codec.decode(&raw)?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::command::Command;
use crate::error::LedgerError;

/// Type-erased decoder for one command kind.
type DecodeFn<C> = Box<dyn Fn(serde_json::Value) -> Result<C, serde_json::Error> + Send + Sync>;

/// Maps a command kind name to the decoder for its payload.
pub struct CommandRegistry<C> {
    decoders: HashMap<&'static str, DecodeFn<C>>,
}

impl<C: Command> CommandRegistry<C> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register the payload type `T` for `kind`, and how to wrap it into `C`.
    ///
    /// # Panics
    ///
    /// Panics if a decoder is already registered for this kind.
    pub fn register<T>(&mut self, kind: &'static str, wrap: fn(T) -> C) -> &mut Self
    where
        T: DeserializeOwned + 'static,
    {
        if self.decoders.contains_key(kind) {
            panic!("decoder already registered for command kind: {}", kind);
        }

        let decode: DecodeFn<C> =
            Box::new(move |payload| serde_json::from_value::<T>(payload).map(wrap));
        self.decoders.insert(kind, decode);
        self
    }

    /// Decode `payload` as the command registered under `kind`.
    pub fn decode(&self, kind: &str, payload: serde_json::Value) -> Result<C, LedgerError> {
        let decode = self
            .decoders
            .get(kind)
            .ok_or_else(|| LedgerError::UnknownCommandKind(kind.to_string()))?;

        decode(payload).map_err(|source| LedgerError::InvalidPayload {
            kind: kind.to_string(),
            source,
        })
    }

    pub fn has(&self, kind: &str) -> bool {
        self.decoders.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.decoders.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl<C: Command> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("registered_kinds", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: serde_json::Value,
}

/// JSON serializer for log rows, backed by a shared registry.
pub struct JsonCodec<C> {
    registry: Arc<CommandRegistry<C>>,
}

impl<C: Command> JsonCodec<C> {
    pub fn new(registry: Arc<CommandRegistry<C>>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CommandRegistry<C> {
        &self.registry
    }

    pub fn encode(&self, command: &C) -> Result<String, LedgerError> {
        serde_json::to_string(command).map_err(|source| LedgerError::Encode {
            kind: command.kind(),
            source,
        })
    }

    pub fn decode(&self, raw: &str) -> Result<C, LedgerError> {
        let envelope: Envelope =
            serde_json::from_str(raw).map_err(LedgerError::MalformedEnvelope)?;
        self.registry.decode(&envelope.kind, envelope.message)
    }
}

impl<C> Clone for JsonCodec<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}
