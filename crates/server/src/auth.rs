//! Caller credential extraction and identity resolution.
//!
//! Tokens arrive either in the `Authorization` header or, for browser
//! sessions, in the `access_token` cookie. The header wins when both are
//! present. A token is then probed against the identity API first as a user
//! token and then as a service token; the first probe to succeed decides the
//! caller's identity.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use sluice_clients::{ClientError, IdentityApi, TokenType};

/// Cookie carrying the user token for browser sessions.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const BEARER_PREFIX: &str = "Bearer ";

/// Why identity resolution failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no credentials presented")]
    NoCredentials,

    /// Neither probe accepted the token. Carries the service-probe error,
    /// the last one attempted.
    #[error("credentials rejected")]
    Rejected {
        #[source]
        source: ClientError,
    },
}

/// Pull the caller's token out of the request headers. The bearer scheme is
/// stripped from both sources; browser sessions store the cookie with the
/// prefix included. Returns an empty string when no credential was presented.
pub fn extract_token(headers: &HeaderMap) -> String {
    if let Some(value) = headers.get(AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && !value.is_empty()
    {
        return strip_bearer(value).to_string();
    }
    cookie_value(headers, ACCESS_TOKEN_COOKIE)
        .map(|value| strip_bearer(&value).to_string())
        .unwrap_or_default()
}

/// Strip the bearer scheme. RFC 6750 names the scheme case-insensitively,
/// so `bearer x` and `Bearer x` both yield `x`.
fn strip_bearer(value: &str) -> &str {
    if value.len() >= BEARER_PREFIX.len()
        && value[..BEARER_PREFIX.len()].eq_ignore_ascii_case(BEARER_PREFIX)
    {
        &value[BEARER_PREFIX.len()..]
    } else {
        value
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(name)
            && let Some(value) = value.strip_prefix('=')
            && !value.is_empty()
        {
            return Some(value.to_string());
        }
    }
    None
}

/// Resolve a token to an identifier: user probe first, service probe second.
/// The probe order is fixed policy; user tokens are the common case on the
/// publishing subnet.
pub async fn resolve_identity(
    identity: &dyn IdentityApi,
    token: &str,
) -> Result<String, AuthError> {
    if token.is_empty() {
        return Err(AuthError::NoCredentials);
    }

    match identity.check_token_identity(token, TokenType::User).await {
        Ok(found) => return Ok(found.identifier),
        Err(error) => {
            tracing::debug!(%error, "token is not a valid user token, probing as service");
        }
    }

    identity
        .check_token_identity(token, TokenType::Service)
        .await
        .map(|found| found.identifier)
        .map_err(|source| AuthError::Rejected { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use sluice_clients::{ClientResult, Identity};
    use std::sync::Mutex;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn extract_token_table() {
        let cases: &[(&[(&str, &str)], &str)] = &[
            (&[], ""),
            (&[("authorization", "Bearer abc")], "abc"),
            (&[("authorization", "bearer abc")], "abc"),
            (&[("authorization", "abc")], "abc"),
            (&[("cookie", "access_token=cookie-tok")], "cookie-tok"),
            (&[("cookie", "access_token=Bearer cookie-tok")], "cookie-tok"),
            (&[("cookie", "theme=dark; access_token=cookie-tok")], "cookie-tok"),
            // Header wins over cookie.
            (
                &[
                    ("authorization", "Bearer header-tok"),
                    ("cookie", "access_token=cookie-tok"),
                ],
                "header-tok",
            ),
            (&[("cookie", "access_token=")], ""),
        ];

        for (input, expected) in cases {
            assert_eq!(extract_token(&headers(input)), *expected, "case {input:?}");
        }
    }

    /// Records probe order and answers from a script.
    struct RecordingIdentity {
        probes: Mutex<Vec<TokenType>>,
        user_ok: bool,
        service_ok: bool,
    }

    #[async_trait]
    impl IdentityApi for RecordingIdentity {
        async fn check_token_identity(
            &self,
            _token: &str,
            token_type: TokenType,
        ) -> ClientResult<Identity> {
            self.probes.lock().unwrap().push(token_type);
            let ok = match token_type {
                TokenType::User => self.user_ok,
                TokenType::Service => self.service_ok,
            };
            if ok {
                Ok(Identity {
                    identifier: format!("{token_type:?}"),
                })
            } else {
                Err(ClientError::Unauthorized("token identity".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn user_probe_runs_first_and_short_circuits() {
        let identity = RecordingIdentity {
            probes: Mutex::new(Vec::new()),
            user_ok: true,
            service_ok: false,
        };
        let identifier = resolve_identity(&identity, "tok").await.unwrap();
        assert_eq!(identifier, "User");
        assert_eq!(*identity.probes.lock().unwrap(), vec![TokenType::User]);
    }

    #[tokio::test]
    async fn service_probe_is_the_fallback() {
        let identity = RecordingIdentity {
            probes: Mutex::new(Vec::new()),
            user_ok: false,
            service_ok: true,
        };
        let identifier = resolve_identity(&identity, "tok").await.unwrap();
        assert_eq!(identifier, "Service");
        assert_eq!(
            *identity.probes.lock().unwrap(),
            vec![TokenType::User, TokenType::Service]
        );
    }

    #[tokio::test]
    async fn both_probes_failing_is_rejected() {
        let identity = RecordingIdentity {
            probes: Mutex::new(Vec::new()),
            user_ok: false,
            service_ok: false,
        };
        let err = resolve_identity(&identity, "tok").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { .. }));
    }

    #[tokio::test]
    async fn empty_token_never_probes() {
        let identity = RecordingIdentity {
            probes: Mutex::new(Vec::new()),
            user_ok: true,
            service_ok: true,
        };
        let err = resolve_identity(&identity, "").await.unwrap_err();
        assert!(matches!(err, AuthError::NoCredentials));
        assert!(identity.probes.lock().unwrap().is_empty());
    }
}
