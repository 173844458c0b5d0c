use anyhow::{Context, Result};

use crate::commands::{open_context, project_runtime};
use crate::logging;
use crate::server::{self, AppState};

/// Start the HTTP API on `bind` (or the configured address) until interrupted.
///
/// Logging is configured here rather than in `main` because the level and
/// format come from the project config.
pub fn serve_command(root: &str, bind: Option<&str>, log_json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    logging::init(&ctx.config.server.log_level, log_json || ctx.config.server.log_json);

    let runtime = project_runtime(&ctx);
    let addr = bind.map(str::to_string).unwrap_or_else(|| ctx.config.server.bind_address.clone());
    let state = AppState::new(ctx.config.name.clone(), ctx.db, Box::new(runtime));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    rt.block_on(server::run(state, &addr))
}
