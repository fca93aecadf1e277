//! Discriminator-based Anchor event decoding.
//!
//! Anchor programs emit events as `discriminator (8 bytes) || borsh(body)`.
//! [`decode_event`] decodes one known event type; [`ProgramEvent::decode`]
//! picks the event type from a static discriminator table.

use crate::error::DecodeError;
use crate::event::{AnchorEvent, CreateEvent, WireEvent};

/// Discriminators of the events this relay understands.
pub mod discriminators {
    /// `sha256("event:CreateEvent")[..8]`
    pub const CREATE_EVENT: [u8; 8] = [27, 114, 169, 77, 222, 235, 99, 118];
}

/// Length of an Anchor event discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Decode `data` as event `T`.
///
/// `data` must start with `T::DISCRIMINATOR`. Bytes left over after the
/// body are ignored, since programs may append fields newer than `T`.
pub fn decode_event<T: AnchorEvent>(data: &[u8]) -> Result<T, DecodeError> {
    let mut body = data
        .strip_prefix(&T::DISCRIMINATOR[..])
        .ok_or_else(|| DecodeError::DiscriminatorMismatch {
            event: T::NAME,
            expected: T::DISCRIMINATOR,
            got: data.iter().take(DISCRIMINATOR_LEN).copied().collect(),
        })?;

    T::deserialize(&mut body).map_err(|e| DecodeError::Borsh {
        event: T::NAME,
        reason: e.to_string(),
    })
}

/// Encode `event` in the on-chain layout, discriminator first.
pub fn encode_event<T: AnchorEvent>(event: &T) -> std::io::Result<Vec<u8>> {
    let mut out = T::DISCRIMINATOR.to_vec();
    event.serialize(&mut out)?;
    Ok(out)
}

/// Every event kind the relay decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramEvent {
    Create(CreateEvent),
}

impl ProgramEvent {
    /// Match the leading discriminator against the known events and decode.
    ///
    /// Returns `None` when the payload is not one of the known events
    /// (including payloads shorter than a discriminator).
    pub fn decode(data: &[u8]) -> Option<Result<Self, DecodeError>> {
        let discriminator: [u8; DISCRIMINATOR_LEN] = data.get(..DISCRIMINATOR_LEN)?.try_into().ok()?;

        match discriminator {
            discriminators::CREATE_EVENT => Some(decode_event::<CreateEvent>(data).map(Self::Create)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => CreateEvent::NAME,
        }
    }

    /// Client-facing projection of the event.
    pub fn into_wire(self) -> WireEvent {
        match self {
            Self::Create(event) => event.into(),
        }
    }
}
