/// P2PKH address handling.
///
/// Addresses are Base58Check strings over a version byte and a 20-byte
/// public key hash.

use std::fmt;
use std::str::FromStr;

use stas_primitives::ec::PublicKey;
use stas_primitives::hash::sha256d;

use crate::ScriptError;

/// Mainnet P2PKH address version byte.
const MAINNET_P2PKH: u8 = 0x00;
/// Testnet P2PKH address version byte.
const TESTNET_P2PKH: u8 = 0x6f;

/// Network selector for address version bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet (prefix 0x00, addresses start with '1').
    #[default]
    Mainnet,
    /// Testnet (prefix 0x6f, addresses start with 'm' or 'n').
    Testnet,
}

impl Network {
    fn version_byte(self) -> u8 {
        match self {
            Network::Mainnet => MAINNET_P2PKH,
            Network::Testnet => TESTNET_P2PKH,
        }
    }
}

/// A P2PKH address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// The Base58Check address string.
    pub address_string: String,
    /// RIPEMD-160(SHA-256(pubkey)).
    pub public_key_hash: [u8; 20],
    /// The network this address belongs to.
    pub network: Network,
}

impl Address {
    /// Parse a Base58Check-encoded address string.
    ///
    /// # Arguments
    /// * `addr` - The address string.
    ///
    /// # Returns
    /// An `Address`, or an error for bad characters, bad length, a failed
    /// checksum or an unknown version byte.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|e| ScriptError::InvalidAddress(format!("{}: {}", addr, e)))?;
        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddress(format!(
                "{}: decoded length {}",
                addr,
                decoded.len()
            )));
        }
        if sha256d(&decoded[..21])[..4] != decoded[21..] {
            return Err(ScriptError::ChecksumFailed);
        }
        let network = match decoded[0] {
            MAINNET_P2PKH => Network::Mainnet,
            TESTNET_P2PKH => Network::Testnet,
            other => return Err(ScriptError::UnsupportedAddress(other)),
        };
        let mut public_key_hash = [0u8; 20];
        public_key_hash.copy_from_slice(&decoded[1..21]);
        Ok(Address {
            address_string: addr.to_string(),
            public_key_hash,
            network,
        })
    }

    /// Build an address from a 20-byte public key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        let mut payload = Vec::with_capacity(25);
        payload.push(network.version_byte());
        payload.extend_from_slice(hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        Address {
            address_string: bs58::encode(&payload).into_string(),
            public_key_hash: *hash,
            network,
        }
    }

    /// Build the address paying to a public key (compressed encoding).
    pub fn from_public_key(key: &PublicKey, network: Network) -> Self {
        Self::from_public_key_hash(&key.hash160(), network)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address_string)
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED_PKH: &str = "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b";

    #[test]
    fn test_parse_mainnet_and_testnet() {
        let main = Address::from_string("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr").unwrap();
        assert_eq!(hex::encode(main.public_key_hash), SHARED_PKH);
        assert_eq!(main.network, Network::Mainnet);

        let test = Address::from_string("mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd").unwrap();
        assert_eq!(test.public_key_hash, main.public_key_hash);
        assert_eq!(test.network, Network::Testnet);
    }

    #[test]
    fn test_encode_matches_known_strings() {
        let mut pkh = [0u8; 20];
        pkh.copy_from_slice(&hex::decode(SHARED_PKH).unwrap());
        assert_eq!(
            Address::from_public_key_hash(&pkh, Network::Mainnet).to_string(),
            "1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr"
        );
        assert_eq!(
            Address::from_public_key_hash(&pkh, Network::Testnet).to_string(),
            "mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd"
        );
    }

    #[test]
    fn test_from_public_key() {
        let key = PublicKey::from_hex(
            "026cf33373a9f3f6c676b75b543180703df225f7f8edbffedc417718a8ad4e89ce",
        )
        .unwrap();
        let addr = Address::from_public_key(&key, Network::Mainnet);
        assert_eq!(addr.to_string(), "114ZWApV4EEU8frr7zygqQcB1V2BodGZuS");
    }

    #[test]
    fn test_rejections() {
        // short
        assert!(Address::from_string("ADD8E55").is_err());
        // last character changed
        assert!(matches!(
            Address::from_string("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMs"),
            Err(ScriptError::ChecksumFailed)
        ));
        // '0' is not in the Base58 alphabet
        assert!(Address::from_string("0E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr").is_err());
    }
}
