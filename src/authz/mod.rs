//! Role-based access control gate.
//!
//! Leaves first:
//! - `claims`: verified claims -> `PrincipalRoles` (fail-closed)
//! - `requirement`: `(scope, role)` descriptors a route demands
//! - `policy`: requirement x principal -> `AccessDecision`
//! - `denial`: denial records and the default responder (JSON / HTML / redirect)
//! - `gate`: the protection factory and the tower layer that ties it together
//!
//! The authentication gateway itself is a collaborator (`gateway::AuthGateway`).

pub mod claims;
pub mod context;
pub mod denial;
pub mod gate;
pub mod gateway;
pub mod options;
pub mod policy;
pub mod requirement;

pub use claims::{PrincipalRoles, TokenClaims, extract_roles};
pub use context::AuthCtx;
pub use denial::{DenialKind, DenialRecord};
pub use gate::{Denial, Gate, GateService, Protection};
pub use gateway::{AuthFailure, AuthGateway};
pub use options::{DenialHandler, ProtectionConfig, ResponseFormat};
pub use policy::{AccessDecision, evaluate};
pub use requirement::{RequirementError, RoleDescriptor, RoleRequirement, RoleScope};
