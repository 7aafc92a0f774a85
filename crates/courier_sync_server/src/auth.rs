//! Per-project token auth.
//!
//! A token is the base64url encoding of `project_id ‖ HMAC-SHA256(secret,
//! project_id)`: opaque to clients, verifiable by any server holding the
//! secret, no per-token server state. Verification is constant-time via
//! the `Mac` API.

use crate::error::{ServerError, ServerResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TAG_LEN: usize = 32;

/// Issues and validates project tokens.
#[derive(Clone)]
pub struct TokenValidator {
    secret: Vec<u8>,
}

impl TokenValidator {
    /// Creates a validator over a signing secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issues the opaque credential for a project.
    pub fn issue(&self, project_id: Uuid) -> String {
        let tag = self.sign(project_id);
        let mut raw = project_id.as_bytes().to_vec();
        raw.extend_from_slice(&tag);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Validates a presented token against the claimed project.
    pub fn validate(&self, project_id: Uuid, token: &str) -> ServerResult<()> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| ServerError::InvalidToken)?;
        if raw.len() != 16 + TAG_LEN {
            return Err(ServerError::InvalidToken);
        }

        let (id_bytes, tag) = raw.split_at(16);
        if id_bytes != project_id.as_bytes() {
            return Err(ServerError::InvalidToken);
        }

        let mut mac = self.mac();
        mac.update(project_id.as_bytes());
        mac.verify_slice(tag).map_err(|_| ServerError::InvalidToken)
    }

    fn sign(&self, project_id: Uuid) -> [u8; TAG_LEN] {
        let mut mac = self.mac();
        mac.update(project_id.as_bytes());
        mac.finalize().into_bytes().into()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }
}
