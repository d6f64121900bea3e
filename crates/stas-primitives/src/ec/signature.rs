//! ECDSA signature with DER serialization and RFC6979 deterministic nonces.
//!
//! Signatures are always held in low-S form (BIP-62), so the DER bytes
//! produced here are accepted by standard script verification.

use k256::ecdsa;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature over secp256k1.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ecdsa::Signature,
}

impl Signature {
    /// Sign a 32-byte digest with RFC6979 deterministic nonces.
    ///
    /// # Arguments
    /// * `hash` - The digest to sign.
    /// * `priv_key` - The signing key.
    ///
    /// # Returns
    /// `Ok(Signature)` in low-S form, or an error if signing fails.
    pub fn sign(hash: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let sig: ecdsa::Signature = priv_key
            .signing_key()
            .sign_prehash(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Self::normalized(sig))
    }

    /// Parse a strict DER-encoded signature.
    ///
    /// High-S input is accepted and normalized.
    ///
    /// # Arguments
    /// * `bytes` - DER bytes without a trailing sighash flag.
    ///
    /// # Returns
    /// `Ok(Signature)` or an error for malformed encodings.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let sig = ecdsa::Signature::from_der(bytes)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Self::normalized(sig))
    }

    /// Serialize as DER: `0x30 <len> 0x02 <r> 0x02 <s>`.
    pub fn to_der(&self) -> Vec<u8> {
        self.inner.to_der().as_bytes().to_vec()
    }

    /// Verify this signature against a digest and public key.
    ///
    /// # Returns
    /// `true` if the signature is valid.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        pub_key
            .verifying_key()
            .verify_prehash(hash, &self.inner)
            .is_ok()
    }

    fn normalized(sig: ecdsa::Signature) -> Self {
        Signature {
            inner: sig.normalize_s().unwrap_or(sig),
        }
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.to_der()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256d;

    #[test]
    fn test_der_roundtrip_preserves_signature() {
        let key = PrivateKey::from_bytes(&[0x42; 32]).unwrap();
        let digest = sha256d(b"token transfer");
        let sig = key.sign(&digest).unwrap();
        let der = sig.to_der();
        assert_eq!(der[0], 0x30);
        assert_eq!(der[1] as usize, der.len() - 2);
        let parsed = Signature::from_der(&der).unwrap();
        assert_eq!(parsed, sig);
        assert!(parsed.verify(&digest, &key.pub_key()));
    }

    #[test]
    fn test_signature_is_low_s() {
        let key = PrivateKey::from_bytes(&[0x07; 32]).unwrap();
        for i in 0u8..16 {
            let digest = sha256d(&[i]);
            let der = key.sign(&digest).unwrap().to_der();
            // s is the second integer; high-S values need a 33rd byte or start >= 0x80
            let r_len = der[3] as usize;
            let s_len = der[5 + r_len] as usize;
            let s_first = der[6 + r_len];
            assert!(s_len <= 32);
            assert!(s_first < 0x80);
        }
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let key = PrivateKey::from_bytes(&[0x42; 32]).unwrap();
        let other = PrivateKey::from_bytes(&[0x43; 32]).unwrap();
        let digest = sha256d(b"token transfer");
        let sig = key.sign(&digest).unwrap();
        assert!(!sig.verify(&digest, &other.pub_key()));
    }

    #[test]
    fn test_from_der_rejects_garbage() {
        assert!(Signature::from_der(&[]).is_err());
        assert!(Signature::from_der(&[0x30, 0x02, 0x02, 0x00]).is_err());
    }
}
