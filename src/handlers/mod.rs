// Two security tiers:
// Public (no auth) → Protected (bearer JWT, caller Identity in request extensions)
pub mod protected;
pub mod public;
