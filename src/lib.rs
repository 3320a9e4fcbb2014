pub mod constants;
pub mod engine;
pub mod maze;
pub mod movement;
pub mod rng;
pub mod score_ledger;
pub mod server_protocol;
pub mod types;
