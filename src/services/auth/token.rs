use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

// Errors returned when the token body cannot be decoded or its signature does not verify.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token parse failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Reasons a well-formed, correctly signed token is still refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidity {
    AlgorithmMismatch {
        expected: Algorithm,
        found: Algorithm,
    },
    NotYetValid {
        nbf: u64,
    },
    IssuedInFuture {
        iat: u64,
    },
    EmptySubject,
}

impl fmt::Display for Invalidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlgorithmMismatch { expected, found } => {
                write!(f, "algorithm mismatch: expected {:?}, found {:?}", expected, found)
            }
            Self::NotYetValid { nbf } => write!(f, "token not valid before {}", nbf),
            Self::IssuedInFuture { iat } => write!(f, "token issued in the future ({})", iat),
            Self::EmptySubject => write!(f, "empty 'sub' claim"),
        }
    }
}

/// Identity claim embedded by the login collaborator.
///
/// `sub` is opaque to the gate; it is handed to downstream handlers unchanged.
/// Numeric subjects (and the legacy `UserId` key) are accepted and kept as their decimal text.
/// `exp`, `iat` and `nbf` are all optional; when present they are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(alias = "UserId", deserialize_with = "string_or_number")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Subject {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Subject::deserialize(deserializer)? {
        Subject::Text(s) => s,
        Subject::Number(n) => n.to_string(),
    })
}

/// A decoded token together with its validity flag.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub claims: IdentityClaims,
    invalidity: Option<Invalidity>,
}

impl ParsedToken {
    pub fn is_valid(&self) -> bool {
        self.invalidity.is_none()
    }

    pub fn invalidity(&self) -> Option<&Invalidity> {
        self.invalidity.as_ref()
    }
}

/// HMAC token verifier built around the process-wide signing secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    algorithm: Algorithm,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: &[u8], algorithm: Algorithm, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret);

        // Accept the whole HMAC family at decode time so that a token signed with a
        // sibling algorithm still parses and is refused by `check_validity` instead.
        let mut validation = Validation::new(algorithm);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = leeway_seconds;
        // `exp` is checked when present but not required.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
            algorithm,
        }
    }

    /// Decode the token, verify its signature and any `exp`, then compute the validity flag.
    pub fn parse(&self, token: &str) -> Result<ParsedToken, TokenError> {
        let data =
            jsonwebtoken::decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)?;

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let invalidity = self.check_validity(&data.header, &data.claims, now).err();

        Ok(ParsedToken {
            claims: data.claims,
            invalidity,
        })
    }

    fn check_validity(
        &self,
        header: &Header,
        claims: &IdentityClaims,
        now: u64,
    ) -> Result<(), Invalidity> {
        if header.alg != self.algorithm {
            return Err(Invalidity::AlgorithmMismatch {
                expected: self.algorithm,
                found: header.alg,
            });
        }

        let leeway = self.validation.leeway;
        if let Some(nbf) = claims.nbf
            && nbf > now.saturating_add(leeway)
        {
            return Err(Invalidity::NotYetValid { nbf });
        }
        if let Some(iat) = claims.iat
            && iat > now.saturating_add(leeway)
        {
            return Err(Invalidity::IssuedInFuture { iat });
        }

        if claims.sub.trim().is_empty() {
            return Err(Invalidity::EmptySubject);
        }

        Ok(())
    }
}
