//! Protection middleware factory and the per-route gate.
//!
//! `Protection` holds one `ProtectionConfig` plus the authentication gateway
//! and hands out independent `Gate`s, each with its own role requirement:
//!
//! ```ignore
//! let api = Protection::new(gateway, ProtectionConfig::json());
//! Router::new()
//!     .route("/users", get(list_users).route_layer(api.require_admin()))
//!     .route("/me", get(me).route_layer(api.authenticate()));
//! ```
//!
//! Per request: authenticate (may suspend) -> extract claims -> evaluate ->
//! forward once, or respond once with a denial. If the response future is
//! dropped (client went away), the in-flight authentication is dropped with
//! it and nothing is forwarded or written.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::Request,
    http::request::Parts,
    response::Response,
};
use tower::{Layer, Service};

use super::claims::{PrincipalRoles, TokenClaims};
use super::context::AuthCtx;
use super::denial::{self, DenialKind, DenialRecord};
use super::gateway::AuthGateway;
use super::options::ProtectionConfig;
use super::policy::{self, AccessDecision};
use super::requirement::{RoleDescriptor, RoleRequirement};

/// Builds gates that share one configuration and one gateway.
#[derive(Clone)]
pub struct Protection {
    gateway: Arc<dyn AuthGateway>,
    config: Arc<ProtectionConfig>,
}

impl Protection {
    pub fn new(gateway: Arc<dyn AuthGateway>, config: ProtectionConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    pub fn gate(&self, requirement: impl Into<RoleRequirement>) -> Gate {
        Gate {
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            requirement: Arc::new(requirement.into()),
            evaluator: policy::evaluate,
        }
    }

    /// Authentication only, no roles.
    pub fn authenticate(&self) -> Gate {
        self.gate(RoleRequirement::authenticated_only())
    }

    pub fn require_role(&self, role: RoleDescriptor) -> Gate {
        self.gate(role)
    }

    pub fn require_roles(&self, roles: impl IntoIterator<Item = RoleDescriptor>) -> Gate {
        self.gate(RoleRequirement::new(roles))
    }

    pub fn require_admin(&self) -> Gate {
        self.require_role(RoleDescriptor::realm("admin"))
    }

    pub fn require_user(&self) -> Gate {
        self.require_role(RoleDescriptor::realm("user"))
    }

    pub fn require_moderator(&self) -> Gate {
        self.require_role(RoleDescriptor::realm("moderator"))
    }

    /// One-off gate whose configuration is a copy of this one with overrides.
    pub fn custom<F>(&self, requirement: impl Into<RoleRequirement>, configure: F) -> Gate
    where
        F: FnOnce(&mut ProtectionConfig),
    {
        let mut config = (*self.config).clone();
        configure(&mut config);

        Gate {
            gateway: self.gateway.clone(),
            config: Arc::new(config),
            requirement: Arc::new(requirement.into()),
            evaluator: policy::evaluate,
        }
    }
}

/// Why a request was not admitted.
#[derive(Debug, Clone)]
pub struct Denial {
    pub kind: DenialKind,
    pub reason: String,
    pub principal: Option<PrincipalRoles>,
    pub missing: Vec<RoleDescriptor>,
}

impl Denial {
    fn unauthenticated(reason: impl Into<String>) -> Self {
        Self {
            kind: DenialKind::Authentication,
            reason: reason.into(),
            principal: None,
            missing: Vec::new(),
        }
    }
}

type Evaluator = fn(&RoleRequirement, &PrincipalRoles) -> AccessDecision;

/// A single protected unit: gateway + configuration + captured requirement.
#[derive(Clone)]
pub struct Gate {
    gateway: Arc<dyn AuthGateway>,
    config: Arc<ProtectionConfig>,
    requirement: Arc<RoleRequirement>,
    evaluator: Evaluator,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("requirement", &self.requirement.labels())
            .field("config", &self.config)
            .finish()
    }
}

impl Gate {
    pub fn requirement(&self) -> &RoleRequirement {
        &self.requirement
    }

    #[cfg(test)]
    pub(crate) fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Authenticate and evaluate without touching a downstream service.
    pub async fn admit(&self, parts: &Parts) -> Result<AuthCtx, Denial> {
        let authenticated =
            tokio::time::timeout(self.config.auth_timeout, self.gateway.authenticate(parts)).await;

        let claims = match authenticated {
            Ok(Ok(claims)) => claims,
            Ok(Err(err)) => return Err(Denial::unauthenticated(err.to_string())),
            Err(_) => return Err(Denial::unauthenticated("authentication timed out")),
        };

        let (requirement, evaluate) = (&self.requirement, self.evaluator);
        let evaluated = panic::catch_unwind(AssertUnwindSafe(|| {
            let claims = TokenClaims::from_value(&claims);
            let roles = claims.principal_roles();
            let decision = evaluate(requirement, &roles);
            (claims, roles, decision)
        }));

        match evaluated {
            Ok((claims, roles, AccessDecision::Allowed)) => Ok(AuthCtx::new(&claims, roles)),
            Ok((_, roles, AccessDecision::Denied { missing })) => Err(Denial {
                kind: DenialKind::Authorization,
                reason: "missing required roles".to_string(),
                principal: Some(roles),
                missing,
            }),
            Err(_) => Err(Denial {
                kind: DenialKind::Evaluation,
                reason: "evaluation error".to_string(),
                principal: None,
                missing: Vec::new(),
            }),
        }
    }

    /// Record, log and answer a denial. Produces exactly one response.
    pub fn deny(&self, parts: &Parts, denial: Denial) -> Response {
        let record = DenialRecord::from_parts(
            denial.kind,
            denial.reason,
            parts,
            &self.requirement,
            denial.principal.as_ref(),
            denial.missing,
        );

        log_denial(&record, self.config.log_unauthorized);

        match &self.config.denial_handler {
            Some(handler) => handler(record),
            None => denial::respond(&record, &self.config, &parts.headers),
        }
    }
}

fn log_denial(record: &DenialRecord, log_unauthorized: bool) {
    // Evaluation failures are always surfaced.
    if record.kind == DenialKind::Evaluation {
        tracing::error!(
            path = %record.path,
            method = %record.method,
            required_roles = ?record.required_roles,
            client_ip = record.client_ip.as_deref().unwrap_or("-"),
            reason = %record.reason,
            "access evaluation failed"
        );
        return;
    }

    if log_unauthorized {
        tracing::warn!(
            kind = ?record.kind,
            path = %record.path,
            method = %record.method,
            required_roles = ?record.required_roles,
            missing_roles = ?record.missing_roles,
            client_ip = record.client_ip.as_deref().unwrap_or("-"),
            user_agent = record.user_agent.as_deref().unwrap_or("-"),
            reason = %record.reason,
            "unauthorized access attempt"
        );
    }
}

impl<S> Layer<S> for Gate {
    type Service = GateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            gate: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GateService<S> {
    inner: S,
    gate: Gate,
}

impl<S> Service<Request> for GateService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // Keep the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gate = self.gate.clone();

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();

            match gate.admit(&parts).await {
                Ok(ctx) => {
                    parts.extensions.insert(ctx);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(denial) => Ok(gate.deny(&parts, denial)),
            }
        })
    }
}
