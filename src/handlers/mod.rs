// handlers/mod.rs - three handler tiers
//
// Public (no auth) → Protected (JWT auth) → Elevated (JWT auth + admin role)
pub mod elevated;
pub mod protected;
pub mod public;
