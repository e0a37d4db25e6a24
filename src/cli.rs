#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTypeArg {
    /// 19k output tokens per window, $18
    Pro,
    /// 88k output tokens per window, $35
    Max5,
    /// 220k output tokens per window, $140
    Max20,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLimitArg {
    /// The plan's fixed output limit
    Static,
    /// P90 of past sessions, falling back to the plan limit
    P90,
}

#[derive(clap::Parser, Debug)]
pub struct Args {
    /// Claude config dir; scanned before ~/.claude and ~/.config/claude
    #[arg(long, env = "CLAUDE_CONFIG_DIR")]
    pub claude_config_dir: Option<String>,

    /// Scan only this projects directory (skips discovery)
    #[arg(long)]
    pub projects_dir: Option<String>,

    /// Transcript of the current session
    #[arg(long, env = "CLAUDE_TRANSCRIPT_PATH")]
    pub transcript: Option<String>,

    /// Hook JSON dump to read `transcript_path` from when --transcript is not given
    #[arg(long, env = "CLAUDE_HOOK_JSON", default_value = crate::utils::DEFAULT_HOOK_JSON)]
    pub hook_file: String,

    /// Plan type: pro|max5|max20
    #[arg(long, value_enum, env = "CLAUDE_PLAN_TYPE", default_value_t = PlanTypeArg::Max5, ignore_case = true)]
    pub plan_type: PlanTypeArg,

    /// Session limit: static|p90
    #[arg(long, value_enum, default_value_t = SessionLimitArg::Static)]
    pub session_limit: SessionLimitArg,

    /// Weekly output-token limit (all models)
    #[arg(long, env = "CLAUDE_WEEKLY_OUTPUT_LIMIT", default_value_t = 300_000)]
    pub weekly_output_limit: u64,

    /// Weekly output-token limit (Sonnet only)
    #[arg(long, env = "CLAUDE_WEEKLY_SONNET_LIMIT", default_value_t = 1_000_000)]
    pub weekly_sonnet_limit: u64,

    /// Monthly extra-usage spending cap in USD
    #[arg(long, env = "CLAUDE_EXTRA_USAGE_LIMIT", default_value_t = 50.0)]
    pub extra_usage_limit: f64,

    /// Only scan events from the last N hours (0 = everything)
    #[arg(long, env = "CLAUDE_SCAN_LOOKBACK_HOURS", default_value_t = 96)]
    pub lookback_hours: i64,

    /// Session window length in hours
    #[arg(long, default_value_t = 5)]
    pub window_hours: i64,

    /// Emit JSON instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Debug mode: log to stderr and print block details
    #[arg(long, env = "CLAUDE_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}
