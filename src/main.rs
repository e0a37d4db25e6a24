use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::debug;

use claude_quota::cli::Args;
use claude_quota::config::QuotaConfig;
use claude_quota::display::{print_debug_summary, print_json_output, print_text_output};
use claude_quota::logging::init_logging;
use claude_quota::models::HookJson;
use claude_quota::quota::compute_quota;
use claude_quota::utils::{claude_paths, dedup_existing_dirs};

fn read_hook_file(path: &Path) -> Result<HookJson> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).context("parse hook json")
}

/// `--transcript` wins; otherwise the hook dump's `transcript_path`, if any.
fn resolve_transcript(args: &Args) -> Option<PathBuf> {
    if let Some(t) = args.transcript.as_deref().filter(|t| !t.trim().is_empty()) {
        return Some(PathBuf::from(t));
    }
    match read_hook_file(Path::new(&args.hook_file)) {
        Ok(hook) => {
            debug!(session = ?hook.session_id, "hook file loaded");
            hook.transcript_path
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        }
        Err(err) => {
            debug!(error = %format!("{err:#}"), "no usable hook file");
            None
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let candidate_dirs = match args.projects_dir.as_deref() {
        Some(dir) => dedup_existing_dirs(vec![PathBuf::from(dir)]),
        None => claude_paths(args.claude_config_dir.as_deref()),
    };
    debug!(dirs = ?candidate_dirs, "candidate directories");

    let config = QuotaConfig {
        candidate_dirs,
        transcript_path: resolve_transcript(&args),
        ..QuotaConfig::from_args(&args)
    };

    let now = Utc::now();
    let report = compute_quota(&config, now);

    if args.json {
        print_json_output(&report, now)?;
    } else {
        print_text_output(&report, now);
    }
    if args.debug {
        eprintln!(
            "Plan: {} ({} output tokens, ${:.2}), session limit: {:?}",
            config.plan.display, config.plan.output_limit, config.plan.cost_limit, config.session_limit
        );
        print_debug_summary(&report);
    }
    Ok(())
}
