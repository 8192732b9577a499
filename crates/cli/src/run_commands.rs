//! `muster run`: build the run settings, load the sources, drive the batch.

use std::{
    io::{BufRead, Write},
    sync::Arc,
    time::Duration,
};

use {
    anyhow::{Context, Result, anyhow},
    clap::Args,
    muster_common::PostJoinAction,
    muster_config::MusterConfig,
    muster_directory::{AccountDirectory, ChannelDirectory},
    muster_engine::{Orchestrator, RunConfig, check_sample_size},
    muster_telegram::{BotNotifier, GatewayConnector},
    tracing::{error, info, warn},
};

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Post-join action: mute (0) or unmute (1).
    #[arg(long)]
    action: Option<PostJoinAction>,
    /// Number of accounts to draw at random (all accounts when omitted).
    #[arg(long)]
    sample: Option<usize>,
    /// Seed for the account draw, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
    /// Seconds to wait between channels.
    #[arg(long)]
    delay: Option<u64>,
    /// Skip completion reports even when `[notify]` is configured.
    #[arg(long, default_value_t = false)]
    no_notify: bool,
    /// Ask for the action and sample size when they are not given as flags.
    #[arg(long, short, default_value_t = false)]
    interactive: bool,
}

/// Settings and sources for one run, checked before anything is contacted.
struct Prepared {
    run: RunConfig,
    accounts: AccountDirectory,
    channels: ChannelDirectory,
}

pub async fn handle_run(args: RunArgs, config: &MusterConfig) -> Result<()> {
    let Prepared {
        run,
        accounts,
        channels,
    } = {
        let stdin = std::io::stdin();
        prepare(&args, config, &mut stdin.lock(), &mut std::io::stdout())?
    };

    info!(
        accounts = accounts.len(),
        channels = channels.len(),
        action = %run.post_join_action,
        sample = ?run.account_sample_size,
        delay_secs = run.inter_channel_delay_secs,
        notify = run.notification_target.is_some(),
        "run prepared"
    );

    let connector = GatewayConnector::new(
        &config.gateway.base_url,
        Duration::from_secs(config.gateway.timeout_secs),
        config.core.api_id,
        config.core.api_hash.clone(),
    )?;
    let mut orchestrator = Orchestrator::new(Arc::new(connector));

    if run.notification_target.is_some()
        && let Some(notify) = &config.notify
    {
        let mut notifier = BotNotifier::new(&notify.bot_token)?;
        if let Some(url) = &notify.api_url {
            let url = reqwest::Url::parse(url)
                .with_context(|| format!("invalid notify.api_url {url:?}"))?;
            notifier = notifier.with_api_url(url);
        }
        if let Err(e) = notifier.check(notify.session.as_deref()).await {
            warn!(error = %e, "notification bot check failed, reports may not arrive");
        }
        orchestrator = orchestrator.with_sink(Arc::new(notifier));
    }

    let report = orchestrator
        .run(&accounts, &channels, &run)
        .await
        .inspect_err(|e| error!(error = %e, "run aborted before processing any pair"))?;

    for result in &report.results {
        println!(
            "{}\t{}\t{}\taction={}\tnotified={}",
            result.account, result.channel, result.outcome, result.action_applied, result.notified
        );
    }
    Ok(())
}

/// Load both sources, ask for missing parameters and reject an oversized
/// sample. Nothing here touches the network.
fn prepare(
    args: &RunArgs,
    config: &MusterConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Prepared> {
    let mut run = run_config(args, config);

    let delimiter = delimiter_byte(config.data.delimiter)?;
    let accounts = AccountDirectory::load(&config.data.sessions, delimiter).inspect_err(|e| {
        error!(error = %e, "failed to load accounts");
    })?;
    let channels = ChannelDirectory::load(&config.data.channels, delimiter).inspect_err(|e| {
        error!(error = %e, "failed to load channels");
    })?;

    if args.interactive {
        if args.action.is_none() {
            run.post_join_action = prompt_action(input, output, run.post_join_action)?;
        }
        if args.sample.is_none() {
            run.account_sample_size =
                prompt_sample(input, output, accounts.len(), run.account_sample_size)?;
        }
    }

    if let Some(requested) = run.account_sample_size {
        check_sample_size(requested, accounts.len())
            .inspect_err(|e| error!(error = %e, "run aborted before processing any pair"))?;
    }

    Ok(Prepared {
        run,
        accounts,
        channels,
    })
}

/// Merge command-line overrides over the `[run]` and `[notify]` sections.
fn run_config(args: &RunArgs, config: &MusterConfig) -> RunConfig {
    let notification_target = if args.no_notify {
        None
    } else {
        config
            .notify
            .as_ref()
            .map(|n| n.chat_id.trim().to_string())
            .filter(|id| !id.is_empty())
    };

    RunConfig {
        post_join_action: args.action.unwrap_or(config.run.post_join_action),
        account_sample_size: args.sample.or(config.run.account_sample_size),
        inter_channel_delay_secs: args.delay.unwrap_or(config.run.inter_channel_delay_secs),
        notification_target,
        seed: args.seed.or(config.run.seed),
    }
}

pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("data.delimiter must be a single ASCII character, got {delimiter:?}"))
}

/// Print `prompt` and read one trimmed line.
fn prompt_line(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<String> {
    write!(output, "{prompt}: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("failed to read answer")?;
    Ok(line.trim().to_string())
}

fn prompt_action(
    input: &mut impl BufRead,
    output: &mut impl Write,
    default: PostJoinAction,
) -> Result<PostJoinAction> {
    let default_index = match default {
        PostJoinAction::Mute => 0,
        PostJoinAction::Unmute => 1,
    };
    let answer = prompt_line(
        input,
        output,
        &format!("Post-join action (0=Mute, 1=Unmute) [{default_index}]"),
    )?;
    if answer.is_empty() {
        return Ok(default);
    }
    Ok(answer.parse()?)
}

fn prompt_sample(
    input: &mut impl BufRead,
    output: &mut impl Write,
    available: usize,
    default: Option<usize>,
) -> Result<Option<usize>> {
    let shown = default.map_or_else(|| "all".to_string(), |n| n.to_string());
    let answer = prompt_line(
        input,
        output,
        &format!("Accounts to use (1-{available}, or \"all\") [{shown}]"),
    )?;
    match answer.as_str() {
        "" => Ok(default),
        a if a.eq_ignore_ascii_case("all") => Ok(None),
        a => a
            .parse::<usize>()
            .map(Some)
            .map_err(|_| anyhow!("invalid sample size {a:?}")),
    }
}
