use std::path::PathBuf;

use anyhow::Context;
use diorama::StageConfig;

fn main() -> anyhow::Result<()> {
    // info for us, GPU backends quiet; RUST_LOG overrides.
    let default = "info,diorama=info,wgpu_hal=off,wgpu_core=off,wgpu=off,naga=off";
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = StageConfig::load_optional(path.as_deref())
        .with_context(|| match &path {
            Some(path) => format!("loading config {}", path.display()),
            None => "loading config".to_owned(),
        })?;

    diorama::run_with_config(config).context("running scene")
}
