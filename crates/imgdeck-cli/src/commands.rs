//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use imgdeck_core::imaging::place;
use imgdeck_core::{
    file_info, parse_color, rename_path, system_paths, BatchOperation, Command, Config, Confirm,
    CropRegion, PreviewMapping, Viewport, WatermarkOptions,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliCommand, LsArgs, OutputArgs, WatermarkArgs};
use crate::prompt::{AutoConfirm, StdinConfirm};
use crate::report;
use crate::session::{BatchTally, Session};
use crate::watcher::{DirWatcher, WatchMessage};

pub async fn run(command: CliCommand, config: &Config, json: bool) -> anyhow::Result<ExitCode> {
    match command {
        CliCommand::Ls(args) => ls(config, args, json).await?,
        CliCommand::Roots => report::print_paths(&system_paths(), json)?,
        CliCommand::Info { path } => {
            let info = file_info(&path).with_context(|| format!("cannot read {}", path.display()))?;
            report::print_file_info(&info, json)?;
        }
        CliCommand::Rename { path, new_name } => {
            let renamed = rename_path(&path, &new_name)?;
            report::print_paths(&[renamed], json)?;
        }
        CliCommand::Delete { paths, yes } => {
            let confirm: Arc<dyn Confirm> = if yes {
                Arc::new(AutoConfirm)
            } else {
                Arc::new(StdinConfirm)
            };
            let mut session = Session::new(config, confirm, json);
            let tally = session
                .run_batch(&paths, |_| BatchOperation::Delete)
                .await?;
            return Ok(summarize("delete", tally, json));
        }
        CliCommand::Compress {
            paths,
            quality,
            output,
        } => {
            let quality = quality.unwrap_or(config.compress.quality);
            let tally = batch(config, json, &paths, |dir| BatchOperation::Compress {
                output_dir: output_dir(config, &output, dir),
                quality,
            })
            .await?;
            return Ok(summarize("compress", tally, json));
        }
        CliCommand::Convert {
            paths,
            format,
            output,
        } => {
            let tally = batch(config, json, &paths, |dir| BatchOperation::Convert {
                output_dir: output_dir(config, &output, dir),
                format,
            })
            .await?;
            return Ok(summarize("convert", tally, json));
        }
        CliCommand::Crop {
            paths,
            x,
            y,
            width,
            height,
            output,
        } => {
            let region = CropRegion::new(x, y, width, height);
            let tally = batch(config, json, &paths, |dir| BatchOperation::Crop {
                output_dir: output_dir(config, &output, dir),
                region,
            })
            .await?;
            return Ok(summarize("crop", tally, json));
        }
        CliCommand::Watermark(args) => return watermark(config, args, json).await,
        CliCommand::Watch { path } => watch(config, path, json).await?,
    }
    Ok(ExitCode::SUCCESS)
}

async fn ls(config: &Config, args: LsArgs, json: bool) -> anyhow::Result<()> {
    let mut session = Session::new(config, Arc::new(AutoConfirm), json);
    session
        .open(args.path.or_else(|| config.general.start_dir.clone()))
        .await?;
    let viewport = args
        .width
        .zip(args.height)
        .map(|(w, h)| Viewport::new(args.scroll, w, h));
    session.show(viewport, args.previews)
}

async fn batch<F>(
    config: &Config,
    json: bool,
    paths: &[PathBuf],
    make_operation: F,
) -> anyhow::Result<BatchTally>
where
    F: Fn(&Path) -> BatchOperation,
{
    let mut session = Session::new(config, Arc::new(AutoConfirm), json);
    session.run_batch(paths, make_operation).await
}

/// `--output`, then the configured output directory, then the source directory.
fn output_dir(config: &Config, args: &OutputArgs, source_dir: &Path) -> PathBuf {
    args.output
        .clone()
        .or_else(|| config.general.output_dir.clone())
        .unwrap_or_else(|| source_dir.to_path_buf())
}

fn summarize(name: &str, tally: BatchTally, json: bool) -> ExitCode {
    info!(
        operation = name,
        succeeded = tally.succeeded,
        failed = tally.failed,
        cancelled = tally.cancelled,
        "batch command finished"
    );
    if !json {
        if tally.cancelled {
            eprintln!("{name}: cancelled");
        } else {
            eprintln!(
                "{name}: {} succeeded, {} failed",
                tally.succeeded, tally.failed
            );
        }
    }
    tally.exit_code()
}

fn watermark_options(config: &Config, args: &WatermarkArgs) -> anyhow::Result<WatermarkOptions> {
    let defaults = &config.watermark;
    let options = WatermarkOptions {
        font_size: args.font_size.or(defaults.font_size),
        color: args.color.clone().unwrap_or_else(|| defaults.color.clone()),
        angle: args.angle.unwrap_or(defaults.angle),
        ..WatermarkOptions::default()
    }
    .with_percent(
        args.x_percent.unwrap_or(defaults.x_percent),
        args.y_percent.unwrap_or(defaults.y_percent),
    );
    parse_color(&options.color)?;
    Ok(options)
}

async fn watermark(config: &Config, args: WatermarkArgs, json: bool) -> anyhow::Result<ExitCode> {
    let options = watermark_options(config, &args)?;

    if args.dry_run {
        for path in &args.paths {
            print_placement(config, path, &options, json)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let tally = batch(config, json, &args.paths, |dir| BatchOperation::Watermark {
        output_dir: output_dir(config, &args.output, dir),
        text: args.text.clone(),
        options: options.clone(),
    })
    .await?;
    Ok(summarize("watermark", tally, json))
}

/// Prints where the watermark lands on the image and on its preview.
fn print_placement(
    config: &Config,
    path: &Path,
    options: &WatermarkOptions,
    json: bool,
) -> anyhow::Result<()> {
    let info = file_info(path)?;
    let (Some(width), Some(height)) = (info.width, info.height) else {
        anyhow::bail!("{} is not a readable image", path.display());
    };

    let placement = place(width, height, options);
    let preview = PreviewMapping::fit(
        width,
        height,
        config.preview.box_width,
        config.preview.box_height,
    )
    .map(|mapping| mapping.map(&placement));

    if json {
        let value = serde_json::json!({
            "path": path,
            "width": width,
            "height": height,
            "x": placement.x,
            "y": placement.y,
            "font_size": placement.font_size,
            "preview": preview.map(|p| serde_json::json!({
                "left": p.left,
                "top": p.top,
                "font_size": p.font_size,
            })),
        });
        println!("{value}");
    } else {
        println!(
            "{}: {width}x{height}, text centre at ({}, {}), font {}px",
            path.display(),
            placement.x,
            placement.y,
            placement.font_size
        );
        if let Some(p) = preview {
            println!(
                "  preview {}x{}: ({:.1}, {:.1}), font {:.1}px",
                config.preview.box_width, config.preview.box_height, p.left, p.top, p.font_size
            );
        }
    }
    Ok(())
}

async fn watch(config: &Config, path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let mut session = Session::new(config, Arc::new(StdinConfirm), json);
    session
        .open(path.or_else(|| config.general.start_dir.clone()))
        .await?;
    session.show(None, false)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = DirWatcher::new(tx)?;
    if let Some(dir) = session.view().location() {
        watcher.watch(dir)?;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(WatchMessage::Changed(dir)) => {
                    if session.dispatch(Command::DirectoryChanged(dir)).await {
                        session.show(None, false)?;
                    }
                }
                Some(WatchMessage::Error(e)) => warn!("Watch error: {e}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
