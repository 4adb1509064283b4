//! Solver module for proxied page fetching
//!
//! Every page is loaded by a remote browser-automation service rather than a
//! plain HTTP GET. This module contains:
//! - The JSON command protocol spoken with the solver
//! - A session-scoped client that creates, uses and destroys one session
//! - The `PageSource` seam the crawl driver fetches through

mod client;
mod protocol;

pub use client::{
    build_solver_client, with_session, FetchRequest, FetchResult, PageSource, SolverClient,
    SolverSession,
};
pub use protocol::{SolverCommand, SolverResponse, Solution};
