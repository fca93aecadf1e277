//! On-chain event records and their client-facing wire form.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::decoder::discriminators;
use crate::error::DecodeError;

/// A 32-byte Solana public key, Borsh-encoded as its raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, BorshSerialize, BorshDeserialize)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl FromStr for Pubkey {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| DecodeError::InvalidPubkey { reason: e.to_string() })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| DecodeError::InvalidPubkey {
            reason: format!("expected 32 bytes, got {}", v.len()),
        })?;
        Ok(Self(bytes))
    }
}

/// An Anchor event type: a Borsh body tagged with a fixed 8-byte discriminator.
pub trait AnchorEvent: BorshDeserialize + BorshSerialize {
    /// Event name as declared in the program IDL.
    const NAME: &'static str;
    /// First 8 bytes of `sha256("event:<NAME>")`.
    const DISCRIMINATOR: [u8; 8];
}

/// Token creation event emitted by the launchpad program.
///
/// Field order matches the on-chain layout. The program appends further
/// fields after `mint`; they are not part of this record.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateEvent {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub mint: Pubkey,
}

impl AnchorEvent for CreateEvent {
    const NAME: &'static str = "CreateEvent";
    const DISCRIMINATOR: [u8; 8] = discriminators::CREATE_EVENT;
}

/// JSON shape sent to downstream clients: `{name, symbol, uri, mint}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub mint: String,
}

impl WireEvent {
    /// Serialize to the exact text frame clients receive.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<CreateEvent> for WireEvent {
    fn from(event: CreateEvent) -> Self {
        Self {
            mint: event.mint.to_string(),
            name: event.name,
            symbol: event.symbol,
            uri: event.uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pubkey_base58_roundtrip() {
        let key = Pubkey::new([7u8; 32]);
        let text = key.to_string();
        assert_eq!(text.parse::<Pubkey>().unwrap(), key);
    }

    #[test]
    fn system_program_renders_as_ones() {
        assert_eq!(Pubkey::default().to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn pubkey_rejects_wrong_length() {
        let short = bs58::encode([1u8; 31]).into_string();
        assert!(matches!(
            short.parse::<Pubkey>(),
            Err(DecodeError::InvalidPubkey { .. })
        ));
    }

    #[test]
    fn wire_event_json_shape() {
        let wire = WireEvent::from(CreateEvent {
            name: "Foo".into(),
            symbol: "FOO".into(),
            uri: "ipfs://x".into(),
            mint: Pubkey::default(),
        });
        let json: serde_json::Value = serde_json::from_str(&wire.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Foo",
                "symbol": "FOO",
                "uri": "ipfs://x",
                "mint": "11111111111111111111111111111111",
            })
        );
    }
}
