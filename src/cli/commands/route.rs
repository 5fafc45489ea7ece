use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{open_session, OutputFormat};
use crate::config::AppConfig;
use crate::session::{resolve, RouteDecision};

/// Print where the guard sends a navigation to `path` with the stored session
pub fn handle(path: String, output_format: OutputFormat, config: &AppConfig) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let decision = resolve(&path, session.as_ref());

    let message = match &decision {
        RouteDecision::Render(route) => format!("render {}", route.path()),
        RouteDecision::Redirect { from, to } => format!("redirect {} -> {}", from, to.path()),
    };
    output_success(
        &output_format,
        &message,
        Some(json!({
            "path": path,
            "target": decision.target().path(),
            "redirected": matches!(decision, RouteDecision::Redirect { .. }),
        })),
    )
}
