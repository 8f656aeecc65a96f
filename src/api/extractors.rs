use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::engine::Viewer;

use super::errors::ApiError;

// ============================================================================
// Actor Extraction
// ============================================================================
//
// Identity is established upstream; this layer only reads what the auth
// gateway forwards:
//   X-Actor-Id     uuid of the caller
//   X-Actor-Role   customer | shop_owner | admin
//   X-Actor-Shops  comma-separated shop ids (shop owners only)
//
// ============================================================================

pub const ACTOR_ID_HEADER: &str = "X-Actor-Id";
pub const ACTOR_ROLE_HEADER: &str = "X-Actor-Role";
pub const ACTOR_SHOPS_HEADER: &str = "X-Actor-Shops";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    ShopOwner,
    Admin,
}

impl Role {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "customer" => Some(Role::Customer),
            "shop_owner" => Some(Role::ShopOwner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub role: Role,
    pub shop_ids: Vec<Uuid>,
}

impl ActorContext {
    pub fn viewer(&self) -> Viewer {
        match self.role {
            Role::Customer => Viewer::Customer { customer_id: self.actor_id },
            Role::ShopOwner => Viewer::ShopOwner {
                owner_id: self.actor_id,
                shop_ids: self.shop_ids.clone(),
            },
            Role::Admin => Viewer::Admin { admin_id: self.actor_id },
        }
    }

    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("{:?} may not perform this operation", self.role)))
        }
    }

    fn from_headers(req: &HttpRequest) -> Result<Self, ApiError> {
        let header = |name: &str| req.headers().get(name).and_then(|value| value.to_str().ok());

        let actor_id = header(ACTOR_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("missing or invalid {} header", ACTOR_ID_HEADER)))?;

        let role = header(ACTOR_ROLE_HEADER)
            .and_then(Role::parse)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing or invalid {} header", ACTOR_ROLE_HEADER)))?;

        let shop_ids = match header(ACTOR_SHOPS_HEADER) {
            None => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(Uuid::parse_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ApiError::Unauthorized(format!("invalid {} header", ACTOR_SHOPS_HEADER)))?,
        };

        Ok(Self { actor_id, role, shop_ids })
    }
}

impl FromRequest for ActorContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = Self::from_headers(req);
        if let Err(e) = &result {
            tracing::warn!(error = %e, path = req.path(), "Rejected request without valid actor headers");
        }
        ready(result)
    }
}
