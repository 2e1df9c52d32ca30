//! Library crate for curator-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod remote;
pub mod routes;
pub mod services;
pub mod state;
