pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod counters;
pub mod datetime;
pub mod filter;
pub mod kv;
pub mod prefs;
pub mod render;
pub mod seed;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskboard"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let kv = kv::FileStore::open(
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open storage at {}",
      data_dir.display()
    )
  })?;

  let zone = datetime::Zone::resolve(
    cfg.timezone()
  );
  let mut app = app::App::new(kv, zone);
  let mut renderer =
    render::Renderer::new(
      &cfg, app.theme
    )?;

  let command = cli.command.unwrap_or(
    cli::Command::List(
      cli::ListArgs::default()
    )
  );
  commands::dispatch(
    &mut app,
    &cfg,
    &mut renderer,
    command
  )?;

  info!("done");
  Ok(())
}
