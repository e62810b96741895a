// handlers/mod.rs - two access tiers
//
// Public (no token) → Protected (bearer access token, role checked per handler)

pub mod protected;
pub mod public;
