// src/ledger/mod.rs

pub mod assembler;
pub mod client;
pub mod deploy;
pub mod descriptor;
pub mod envelope;
pub mod models;
pub mod router;
pub mod synthesizer;
