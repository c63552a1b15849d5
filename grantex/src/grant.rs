//! Grant token claims and the verified grant they produce

use std::convert::TryFrom;

use grantex_jose::{
    clock::UnixTime,
    jwt::{Audiences, CoreClaims},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::scope::{Scope, Scopes};

/// A registered claim carried a value of the wrong shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("'{claim}' claim must be {expected}")]
pub struct InvalidClaim {
    claim: &'static str,
    expected: &'static str,
}

impl InvalidClaim {
    /// The name of the offending claim
    #[must_use]
    pub fn claim(&self) -> &'static str {
        self.claim
    }
}

const fn invalid_claim(claim: &'static str, expected: &'static str) -> InvalidClaim {
    InvalidClaim { claim, expected }
}

/// The claims of a grant token, as decoded from its payload
///
/// Decoding is lenient about the grant-specific claims: a string claim that
/// holds anything other than a string is treated as absent, a `scp` claim
/// that is not an array yields no scopes, and non-string members of `scp`
/// are skipped. The registered time claims must be numbers when present,
/// and `aud` must be a string or an array of strings. Unknown claims are
/// ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
#[must_use]
pub struct GrantClaims {
    jti: Option<String>,
    sub: Option<String>,
    agt: Option<String>,
    dev: Option<String>,
    grnt: Option<String>,
    scp: Scopes,
    aud: Audiences,
    iat: Option<UnixTime>,
    exp: Option<UnixTime>,
    nbf: Option<UnixTime>,
    parent_agt: Option<String>,
    parent_grnt: Option<String>,
    delegation_depth: Option<u32>,
}

impl GrantClaims {
    /// The token identifier (`jti`)
    #[must_use]
    pub fn jti(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// The grant identifier (`grnt`)
    #[must_use]
    pub fn grnt(&self) -> Option<&str> {
        self.grnt.as_deref()
    }

    /// The scopes granted (`scp`)
    pub fn scopes(&self) -> &Scopes {
        &self.scp
    }

    /// Issued at (`iat`)
    #[must_use]
    pub fn iat(&self) -> Option<UnixTime> {
        self.iat
    }
}

impl CoreClaims for GrantClaims {
    fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    fn aud(&self) -> &Audiences {
        &self.aud
    }
}

impl TryFrom<Map<String, Value>> for GrantClaims {
    type Error = InvalidClaim;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let string = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_owned);

        let time = |name: &'static str| -> Result<Option<UnixTime>, InvalidClaim> {
            match map.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => UnixTime::deserialize(v)
                    .map(Some)
                    .map_err(|_| invalid_claim(name, "a number of seconds")),
            }
        };

        let scp = match map.get("scp") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(Scope::from)
                .collect(),
            _ => Scopes::new(),
        };

        let aud = match map.get("aud") {
            None | Some(Value::Null) => Audiences::empty(),
            Some(v) => Audiences::deserialize(v)
                .map_err(|_| invalid_claim("aud", "a string or an array of strings"))?,
        };

        Ok(Self {
            jti: string("jti"),
            sub: string("sub"),
            agt: string("agt"),
            dev: string("dev"),
            grnt: string("grnt"),
            scp,
            aud,
            iat: time("iat")?,
            exp: time("exp")?,
            nbf: time("nbf")?,
            parent_agt: string("parentAgt"),
            parent_grnt: string("parentGrnt"),
            delegation_depth: map.get("delegationDepth").and_then(delegation_depth),
        })
    }
}

/// Depth is counted in whole hops; negative or non-numeric values are
/// treated as absent
fn delegation_depth(value: &Value) -> Option<u32> {
    if let Some(depth) = value.as_u64() {
        return u32::try_from(depth).ok();
    }

    let depth = value.as_f64()?;
    if depth.is_finite() && depth >= 0.0 && depth <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let depth = depth.trunc() as u32;
        Some(depth)
    } else {
        None
    }
}

/// A grant that has passed verification
///
/// Serializes with the field names used by the Grantex API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct VerifiedGrant {
    token_id: String,
    grant_id: String,
    principal_id: String,
    agent_did: String,
    developer_id: String,
    scopes: Scopes,
    issued_at: UnixTime,
    expires_at: UnixTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_agent_did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_grant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delegation_depth: Option<u32>,
}

impl VerifiedGrant {
    /// The token identifier
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// The grant identifier, which is the token identifier when the token
    /// does not name a grant
    #[must_use]
    pub fn grant_id(&self) -> &str {
        &self.grant_id
    }

    /// The principal on whose behalf the agent acts
    #[must_use]
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    /// The DID of the agent holding the grant
    #[must_use]
    pub fn agent_did(&self) -> &str {
        &self.agent_did
    }

    /// The developer that registered the agent
    #[must_use]
    pub fn developer_id(&self) -> &str {
        &self.developer_id
    }

    /// The scopes granted, in token order
    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// When the token was issued
    #[must_use]
    pub fn issued_at(&self) -> UnixTime {
        self.issued_at
    }

    /// When the token expires
    #[must_use]
    pub fn expires_at(&self) -> UnixTime {
        self.expires_at
    }

    /// The DID of the agent that delegated this grant
    #[must_use]
    pub fn parent_agent_did(&self) -> Option<&str> {
        self.parent_agent_did.as_deref()
    }

    /// The grant this one was delegated from
    #[must_use]
    pub fn parent_grant_id(&self) -> Option<&str> {
        self.parent_grant_id.as_deref()
    }

    /// How many delegation hops separate this grant from the root grant
    #[must_use]
    pub fn delegation_depth(&self) -> Option<u32> {
        self.delegation_depth
    }
}

impl From<GrantClaims> for VerifiedGrant {
    fn from(claims: GrantClaims) -> Self {
        let token_id = claims.jti.unwrap_or_default();
        let grant_id = claims.grnt.unwrap_or_else(|| token_id.clone());

        Self {
            token_id,
            grant_id,
            principal_id: claims.sub.unwrap_or_default(),
            agent_did: claims.agt.unwrap_or_default(),
            developer_id: claims.dev.unwrap_or_default(),
            scopes: claims.scp,
            issued_at: claims.iat.unwrap_or_default(),
            expires_at: claims.exp.unwrap_or_default(),
            parent_agent_did: claims.parent_agt,
            parent_grant_id: claims.parent_grnt,
            delegation_depth: claims.delegation_depth,
        }
    }
}
