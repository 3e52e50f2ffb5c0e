use std::time::Duration;

use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use stagepack_core::download::ClientSettings;
use stagepack_core::download::constants::BROWSER_USER_AGENT;
use stagepack_core::{PipelineConfig, Schedule};

use super::config_file::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which arguments were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) input_dir: bool,
    pub(crate) output: bool,
    pub(crate) assets_dir: bool,
    pub(crate) document_prefix: bool,
    pub(crate) base_url: bool,
    pub(crate) concurrency: bool,
    pub(crate) batch_delay: bool,
    pub(crate) timeout: bool,
    pub(crate) max_redirects: bool,
    pub(crate) schedule: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Effective settings after merging defaults, file config and CLI flags.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) pipeline: PipelineConfig,
    pub(crate) client: ClientSettings,
    pub(crate) concurrency: usize,
    pub(crate) batch_delay: Duration,
    pub(crate) schedule: Schedule,
}

impl RunSettings {
    pub(crate) fn from_args(args: &Args) -> Self {
        Self {
            pipeline: PipelineConfig {
                input_dir: args.input_dir.clone(),
                output_path: args.output.clone(),
                assets_dir: args.assets_dir.clone(),
                document_prefix: args.document_prefix.clone(),
            },
            client: ClientSettings {
                base_url: args.base_url.clone(),
                user_agent: args
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| BROWSER_USER_AGENT.to_string()),
                request_timeout: Duration::from_secs(args.timeout),
                max_redirects: args.max_redirects,
            },
            concurrency: usize::from(args.concurrency),
            batch_delay: Duration::from_millis(args.batch_delay),
            schedule: args.schedule,
        }
    }
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = collect_sources(&matches);
    (args, sources)
}

#[cfg(test)]
pub(crate) fn try_parse_cli_from<I, T>(itr: I) -> Result<(Args, CliValueSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(itr)?;
    let args = Args::from_arg_matches(&matches)?;
    let sources = collect_sources(&matches);
    Ok((args, sources))
}

fn collect_sources(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        input_dir: is_commandline_value(matches, "input_dir"),
        output: is_commandline_value(matches, "output"),
        assets_dir: is_commandline_value(matches, "assets_dir"),
        document_prefix: is_commandline_value(matches, "document_prefix"),
        base_url: is_commandline_value(matches, "base_url"),
        concurrency: is_commandline_value(matches, "concurrency"),
        batch_delay: is_commandline_value(matches, "batch_delay"),
        timeout: is_commandline_value(matches, "timeout"),
        max_redirects: is_commandline_value(matches, "max_redirects"),
        schedule: is_commandline_value(matches, "schedule"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills every argument not given on the command line from the file config.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.input_dir
            && let Some(input_dir) = &file_config.input_dir
        {
            args.input_dir = input_dir.clone();
        }

        if !cli_sources.output
            && let Some(output) = &file_config.output
        {
            args.output = output.clone();
        }

        if !cli_sources.assets_dir
            && let Some(assets_dir) = &file_config.assets_dir
        {
            args.assets_dir = assets_dir.clone();
        }

        if !cli_sources.document_prefix
            && let Some(prefix) = &file_config.document_prefix
        {
            args.document_prefix = prefix.clone();
        }

        if !cli_sources.base_url
            && let Some(base_url) = &file_config.base_url
        {
            args.base_url = base_url.clone();
        }

        if !cli_sources.concurrency
            && let Some(concurrency) = file_config.concurrency
        {
            args.concurrency = concurrency;
        }

        if !cli_sources.batch_delay
            && let Some(delay) = file_config.batch_delay_ms
        {
            args.batch_delay = delay;
        }

        if !cli_sources.timeout
            && let Some(timeout) = file_config.timeout_secs
        {
            args.timeout = timeout;
        }

        if !cli_sources.max_redirects
            && let Some(max_redirects) = file_config.max_redirects
        {
            args.max_redirects = max_redirects;
        }

        if !cli_sources.schedule
            && let Some(schedule) = file_config.schedule
        {
            args.schedule = schedule;
        }

        if args.user_agent.is_none() {
            args.user_agent.clone_from(&file_config.user_agent);
        }

        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }
    }

    if !(1..=100).contains(&args.concurrency) {
        bail!(
            "Invalid effective concurrency value: {}. Expected range: 1..=100",
            args.concurrency
        );
    }
    if args.batch_delay > 60_000 {
        bail!(
            "Invalid effective batch_delay value: {}. Expected range: 0..=60000",
            args.batch_delay
        );
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    match verbosity {
        VerbositySetting::Default => {
            args.quiet = false;
            args.verbose = 0;
        }
        VerbositySetting::Verbose => {
            args.quiet = false;
            args.verbose = 1;
        }
        VerbositySetting::Quiet => {
            args.quiet = true;
            args.verbose = 0;
        }
        VerbositySetting::Debug => {
            args.quiet = false;
            args.verbose = 2;
        }
    }
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
