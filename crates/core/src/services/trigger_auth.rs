//! Trigger authorization.
//!
//! Cron endpoints accept two kinds of caller: the scheduler's service
//! account, presenting a signed identity token, and (when enabled) an
//! administrator presenting their session token.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use polity_common::{
    AppError, AppResult,
    config::{JwtAlgorithm, TriggerConfig},
};
use polity_db::repositories::UserRepository;
use serde::Deserialize;
use tracing::{debug, warn};

/// Who started a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerPrincipal {
    /// The scheduler service account.
    Scheduler { email: String },
    /// An administrator using their session token.
    Admin { user_id: String },
}

impl std::fmt::Display for TriggerPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduler { email } => write!(f, "scheduler:{email}"),
            Self::Admin { user_id } => write!(f, "admin:{user_id}"),
        }
    }
}

/// Claims read from a scheduler identity token.
#[derive(Debug, Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    sub: Option<String>,
}

/// Verifies cron callers.
#[derive(Clone)]
pub struct TriggerAuthorizer {
    user_repo: UserRepository,
    key: Option<DecodingKey>,
    validation: Validation,
    scheduler_suffix: String,
    service_account_domain: String,
    allow_admin_override: bool,
}

impl TriggerAuthorizer {
    /// Create an authorizer from configuration.
    ///
    /// Without a configured key only the admin path is available, and a
    /// configuration with neither path is rejected.
    pub fn new(config: &TriggerConfig, user_repo: UserRepository) -> AppResult<Self> {
        let (algorithm, key) = match config.jwt_algorithm {
            JwtAlgorithm::Hs256 => (
                Algorithm::HS256,
                config
                    .jwt_secret
                    .as_deref()
                    .map(|secret| DecodingKey::from_secret(secret.as_bytes())),
            ),
            JwtAlgorithm::Rs256 => (
                Algorithm::RS256,
                config
                    .jwt_public_key_pem
                    .as_deref()
                    .map(|pem| DecodingKey::from_rsa_pem(pem.as_bytes()))
                    .transpose()
                    .map_err(|e| AppError::Config(format!("Invalid trigger public key: {e}")))?,
            ),
        };

        if key.is_none() {
            if !config.allow_admin_override {
                return Err(AppError::Config(
                    "No trigger token key configured and admin override is disabled; \
                     no caller could run a tick"
                        .to_string(),
                ));
            }
            warn!("No trigger token key configured; only admin session tokens can run ticks");
        }

        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        if !config.issuers.is_empty() {
            validation.set_issuer(&config.issuers);
        }

        Ok(Self {
            user_repo,
            key,
            validation,
            scheduler_suffix: config
                .scheduler_email_suffix
                .trim_end_matches('@')
                .to_string(),
            service_account_domain: config.service_account_domain.clone(),
            allow_admin_override: config.allow_admin_override,
        })
    }

    /// Authorize a request from its `Authorization` header value.
    pub async fn authorize(&self, header: Option<&str>) -> AppResult<TriggerPrincipal> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?;

        if let Some(email) = self.verify_scheduler_token(token) {
            return Ok(TriggerPrincipal::Scheduler { email });
        }

        if self.allow_admin_override
            && let Some(user) = self.user_repo.find_by_token(token).await?
        {
            if user.is_admin && !user.is_banned {
                return Ok(TriggerPrincipal::Admin { user_id: user.id });
            }
            debug!(user_id = %user.id, "Session token is not an active admin");
        }

        Err(AppError::Unauthorized)
    }

    /// Decode a scheduler token, returning its email if acceptable.
    fn verify_scheduler_token(&self, token: &str) -> Option<String> {
        let key = self.key.as_ref()?;

        let claims = match decode::<IdentityClaims>(token, key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(error = %e, "Token is not a valid scheduler identity token");
                return None;
            }
        };

        if claims.email_verified == Some(false) {
            debug!(sub = ?claims.sub, "Scheduler email not verified");
            return None;
        }

        let email = claims.email?;
        if is_scheduler_email(&email, &self.scheduler_suffix, &self.service_account_domain) {
            Some(email)
        } else {
            debug!(email = %email, sub = ?claims.sub, "Token email is not a scheduler account");
            None
        }
    }
}

/// Whether `email` is `<name><suffix>@<project><domain>`.
///
/// `name` and `project` must be non-empty and `project` is a single label.
#[must_use]
pub fn is_scheduler_email(email: &str, suffix: &str, domain: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };

    let name_ok = local
        .strip_suffix(suffix)
        .is_some_and(|name| !name.is_empty());

    let project_ok = host
        .strip_suffix(domain)
        .is_some_and(|project| !project.is_empty() && !project.contains('.'));

    name_ok && project_ok
}
