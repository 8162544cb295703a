//! Interactive REPL for Unscatter
//!
//! Each line of text is analyzed through the gateway; slash commands manage
//! attached images and inspect cache and limiter state.

mod session;

pub use session::ReplSession;

use std::sync::Arc;

use eyre::{Context, Result};

use crate::config::Config;
use crate::gateway::AnalysisGateway;

/// Run the interactive REPL
///
/// This is the main entry point for `us repl`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let gateway = AnalysisGateway::from_config(config).context("Failed to create analysis client")?;

    let mut session = ReplSession::new(Arc::new(gateway));
    session.run().await
}
