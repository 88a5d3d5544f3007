use crate::cli::{Cli, Commands, VideosArgs};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::warn;
use vidshrink::engine::policy::{base_bitrate_for, estimate_output_size_bytes, is_acceptable};
use vidshrink::engine::{
    BatchRunner, CapabilityError, CapabilityProbe, FfmpegCapabilityProbe, FfmpegExecutor,
    FfprobeProbe, LibvmafScorer, MediaProbe, OutcomeLog, RunConfig, TranscodeController,
    build_encode_cmd, gather_candidates, promote_optimal_files, scratch_path,
};
use vidshrink::stats::{format_bytes, format_duration, format_projection, format_savings};
use vidshrink::{config, engine};

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

pub fn run(cli: Cli) {
    let result = match cli.command {
        Commands::Videos(args) => handle_videos(&args),
        Commands::Rename {
            dry_run,
            directories,
        } => handle_rename(&directories, dry_run),
        Commands::CheckFfmpeg => handle_check_ffmpeg(),
        Commands::Probe { file } => handle_probe(&file),
        Commands::InitConfig => handle_init_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn handle_videos(args: &VideosArgs) -> Result<()> {
    let started = Instant::now();
    let cfg = config::Config::load()?;
    let flags = args.flags();
    let settings = cfg.transcode_settings(&flags);

    println!("Dry Run: {}", yes_no(args.dry_run));
    println!("Overwrite: {}", yes_no(settings.overwrite));
    if !args.dry_run {
        println!("Replace Existing: {}", yes_no(settings.replace_existing));
        println!("Check Quality: {}", yes_no(settings.check_quality));
        if settings.replace_existing && !settings.check_quality {
            warn!("Replacing existing files without quality check may lead to data loss.");
        }
    }
    println!();

    let capabilities = FfmpegCapabilityProbe.detect(cfg.use_cpu(&flags))?;
    println!("Available cores: {}", capabilities.cpu_threads);
    println!("Using encoder: {}", capabilities.encoder.display_name());
    if capabilities.encoder == engine::VideoEncoder::Nvenc {
        println!(
            "NVENC Temporal AQ: {}",
            if capabilities.supports_temporal_aq { "available" } else { "not available" }
        );
    }
    println!(
        "VMAF support: {}",
        if capabilities.supports_quality_scoring { "available" } else { "not available" }
    );
    if settings.check_quality && !capabilities.supports_quality_scoring {
        return Err(CapabilityError::QualityScoringUnavailable.into());
    }
    println!();

    let plan = gather_candidates(&args.directories, &FfprobeProbe, &settings);
    println!("\n{}", format_projection(&plan.projection(), plan.skipped.len()));

    let run_config = RunConfig::new(settings, capabilities);

    if args.dry_run {
        for file in &plan.candidates {
            let Some(base) = base_bitrate_for(file.width, file.height) else {
                continue;
            };
            let cmd = build_encode_cmd(
                file,
                &run_config.capabilities,
                base,
                run_config.settings.spike_factor,
                &scratch_path(&file.path),
            );
            println!("\n{}", cmd.display());
        }
        return Ok(());
    }

    let executor = FfmpegExecutor::default();
    let scorer = LibvmafScorer::new(
        run_config.capabilities.cpu_threads,
        run_config.capabilities.supports_quality_scoring,
    );
    let controller = TranscodeController::new(&run_config, &executor, Some(&scorer))?;
    let mut outcome_log = OutcomeLog::new(cfg.outcome_log_path(args.outcome_log.as_deref())?);

    let report = BatchRunner::new(&controller, &mut outcome_log).run(&plan);

    println!("\n{}", report.stats);
    for failure in &report.failures {
        println!("Errored: {}", failure.path.display());
    }
    if report.outcomes.iter().any(|o| o.is_finalized()) {
        println!("Outcome log: {}", outcome_log.path().display());
    }
    println!("Elapsed: {}", format_duration(started.elapsed().as_secs_f64()));
    Ok(())
}

fn handle_rename(directories: &[PathBuf], dry_run: bool) -> Result<()> {
    let report = promote_optimal_files(directories, dry_run)?;

    for p in &report.promotions {
        let original = p
            .original_size
            .map(format_bytes)
            .unwrap_or_else(|| "missing".to_string());
        println!(
            "{}{} -> {} ({} -> {})",
            if dry_run { "[dry run] " } else { "" },
            p.optimal_path.display(),
            p.target_path.display(),
            original,
            format_bytes(p.optimal_size)
        );
    }

    println!(
        "\nFiles: {}\nTotal Savings: {}",
        report.promotions.len(),
        format_savings(report.total_savings_bytes())
    );
    Ok(())
}

fn handle_check_ffmpeg() -> Result<()> {
    let ffmpeg = engine::ffmpeg_version()?;
    println!("ffmpeg found: {}", ffmpeg);
    let ffprobe = engine::ffprobe_version()?;
    println!("ffprobe found: {}", ffprobe);

    match FfmpegCapabilityProbe.detect(false) {
        Ok(caps) => {
            println!("Hardware encoder: {}", caps.encoder.display_name());
            println!("NVENC Temporal AQ: {}", yes_no(caps.supports_temporal_aq));
            println!("VMAF support: {}", yes_no(caps.supports_quality_scoring));
        }
        Err(e) => println!("Hardware encoder: {}", e),
    }
    match FfmpegCapabilityProbe.detect(true) {
        Ok(_) => println!("Software encoder: available"),
        Err(e) => println!("Software encoder: {}", e),
    }
    Ok(())
}

fn handle_probe(file: &Path) -> Result<()> {
    let props = FfprobeProbe
        .probe(file)
        .with_context(|| format!("Failed to probe {}", file.display()))?;

    println!("File: {}", props.path.display());
    println!("Dimensions: {}x{}", props.width, props.height);
    println!("Codec: {}", props.codec_name);
    println!("Pixel format: {}", props.pix_fmt);
    println!("Current bitrate: {} Kbps", props.bitrate_kbps());
    println!("Duration: {:.2}s", props.duration_s);
    println!("Current size: {}", format_bytes(props.size_bytes));
    for (label, value) in [
        ("Color space", &props.color_space),
        ("Color primaries", &props.color_primaries),
        ("Color transfer", &props.color_transfer),
    ] {
        if let Some(v) = value {
            println!("{}: {}", label, v);
        }
    }

    let cfg = config::Config::load().unwrap_or_default();
    match base_bitrate_for(props.width, props.height) {
        Some(base) => {
            let projected = estimate_output_size_bytes(base, props.duration_s);
            println!("Target bitrate: {} Kbps", base);
            println!(
                "Acceptable: {}",
                yes_no(is_acceptable(
                    props.bitrate_kbps(),
                    base,
                    cfg.quality.overhead_factor
                ))
            );
            println!("Projected size: {}", format_bytes(projected));
            println!(
                "Projected Savings: {}",
                format_savings(props.size_bytes as i64 - projected as i64)
            );
        }
        None => println!("Unsupported resolution, would be skipped"),
    }
    Ok(())
}

fn handle_init_config() -> Result<()> {
    match config::Config::config_path().and_then(|path| {
        if path.exists() {
            config::Config::load_from(&path).map(|cfg| (path, cfg))
        } else {
            anyhow::bail!("no config file at {}", path.display())
        }
    }) {
        Ok((path, cfg)) => {
            println!("Config loaded successfully from {}", path.display());
            println!("{:#?}", cfg);
            Ok(())
        }
        Err(e) => {
            println!("Config missing or invalid: {:#}", e);
            println!("Creating default config...");

            let cfg = config::Config::default();
            cfg.save().context("Failed to save default config")?;
            match config::Config::config_path() {
                Ok(path) => println!("Default config saved to {}", path.display()),
                Err(e) => println!("Default config saved (path unknown): {:#}", e),
            }
            Ok(())
        }
    }
}
