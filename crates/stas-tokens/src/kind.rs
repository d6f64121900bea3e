//! Token kinds and their per-kind rules.
//!
//! A redeem-split resolves the kind of its token UTXO once and threads the
//! resulting `TokenKind` through planning, fragment building and checking.

use std::fmt;

use stas_script::Script;

use crate::error::TokenError;
use crate::script::dstas_builder::{build_dstas_locking_script, DstasLockingParams};
use crate::script::reader::{read_token_script, TokenScript};
use crate::script::stas_builder::{build_stas_locking_script, rebind_stas_owner};

/// The token protocol a locking script follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// STAS v2.
    Stas,
    /// dSTAS, which can carry an auxiliary data output.
    Dstas,
}

impl TokenKind {
    /// Classify a token UTXO's locking script.
    ///
    /// # Returns
    /// The kind, or `InvalidUtxo` for scripts that are not token scripts.
    pub fn detect(script: &Script) -> Result<Self, TokenError> {
        read_token_script(script.to_bytes())
            .map(|parsed| parsed.kind())
            .ok_or_else(|| TokenError::InvalidUtxo("token UTXO is not a STAS output".into()))
    }

    /// Whether transactions of this kind may append a data-carrier output.
    pub fn supports_data(self) -> bool {
        matches!(self, TokenKind::Dstas)
    }

    /// Parse `script` and require it to be of this kind.
    pub fn parse(self, script: &Script) -> Result<TokenScript, TokenError> {
        match read_token_script(script.to_bytes()) {
            Some(parsed) if parsed.kind() == self => Ok(parsed),
            _ => Err(TokenError::InvalidScript(format!("not a {} script", self))),
        }
    }

    /// Owner public key hash of a script of this kind.
    pub fn owner_hash(self, script: &Script) -> Result<[u8; 20], TokenError> {
        Ok(self.parse(script)?.owner_hash())
    }

    /// Redemption public key hash of a script of this kind.
    pub fn redemption_hash(self, script: &Script) -> Result<[u8; 20], TokenError> {
        Ok(self.parse(script)?.redemption_hash())
    }

    /// Produce the locking script for a split output owned by `owner`.
    ///
    /// STAS v2 outputs keep every byte but the owner hash. dSTAS outputs are
    /// rebuilt with the source's redemption hash, flags and service fields
    /// and an empty action slot.
    ///
    /// # Arguments
    /// * `source` - The token UTXO's locking script.
    /// * `owner` - Public key hash of the new owner.
    pub fn retemplate(self, source: &Script, owner: &[u8; 20]) -> Result<Script, TokenError> {
        match self.parse(source)? {
            TokenScript::Stas(_) => rebind_stas_owner(source, owner),
            TokenScript::Dstas(fields) => {
                build_dstas_locking_script(&DstasLockingParams::rebound(&fields, *owner))
            }
        }
    }

    /// Check a re-templated output against the destination it was built for.
    ///
    /// The output must read back as this kind, be owned by `destination`,
    /// and keep the source's redemption hash. A frozen source fails.
    ///
    /// # Returns
    /// `Ok(())`, `TokenFrozen`, or `InvalidScript` naming the mismatch.
    pub fn check_destination(
        self,
        source: &Script,
        retemplated: &Script,
        destination: &[u8; 20],
    ) -> Result<(), TokenError> {
        let source = self.parse(source)?;
        if source.is_frozen() {
            return Err(TokenError::TokenFrozen);
        }
        let output = self.parse(retemplated)?;
        if output.owner_hash() != *destination {
            return Err(TokenError::InvalidScript(format!(
                "owner {} does not match destination {}",
                hex::encode(output.owner_hash()),
                hex::encode(destination)
            )));
        }
        if output.redemption_hash() != source.redemption_hash() {
            return Err(TokenError::InvalidScript(format!(
                "redemption {} does not match token redemption {}",
                hex::encode(output.redemption_hash()),
                hex::encode(source.redemption_hash())
            )));
        }
        Ok(())
    }

    /// A well-formed script of this kind with the given hashes and default
    /// flags, for callers that only need the shape of a token output.
    pub fn template_script(
        self,
        owner: &[u8; 20],
        redemption: &[u8; 20],
    ) -> Result<Script, TokenError> {
        match self {
            TokenKind::Stas => build_stas_locking_script(owner, redemption, &[0x00], &[]),
            TokenKind::Dstas => build_dstas_locking_script(&DstasLockingParams {
                owner_hash: *owner,
                redemption_hash: *redemption,
                action_data: Vec::new(),
                frozen: false,
                flags: vec![0x00],
                service_fields: Vec::new(),
            }),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Stas => write!(f, "STAS"),
            TokenKind::Dstas => write!(f, "dSTAS"),
        }
    }
}
