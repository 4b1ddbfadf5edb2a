use serde::{Deserialize, Serialize};

/// Claims carried by the session cookie
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaim {
    pub sub: String,
    pub csrf: String,
    pub iat: usize,
    pub exp: usize,
}
