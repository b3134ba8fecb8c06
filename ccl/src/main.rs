use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use ccl::io::{Channel, MaskSource};
use ccl::{Execution, LabelConfig, PassDriver};
use common::log_setup::{setup_logging, LogOptions};

/// Label 8-connected foreground blobs of an image and write them as pseudo-color.
#[derive(Parser, Debug)]
#[command(name = "ccl", version)]
struct Cli {
    /// Input image.
    input: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long, default_value = "output.png")]
    out: PathBuf,

    /// Pass configuration file (.yaml, .yml or .json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of generations, generation 0 included.
    #[arg(long)]
    passes: Option<usize>,

    /// Pointer-jumping hops per pixel per pass.
    #[arg(long)]
    hop_budget: Option<usize>,

    /// Worker threads for parallel passes.
    #[arg(long)]
    threads: Option<usize>,

    /// Run every pass on a single thread.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Stop as soon as a pass changes no label.
    #[arg(long, default_value_t = false)]
    stop_when_stable: bool,

    /// Channel tested against the threshold.
    #[arg(long, value_enum, default_value_t = Channel::Green)]
    channel: Channel,

    /// Pixels whose channel value is greater than this are foreground.
    #[arg(long, default_value_t = 127)]
    threshold: u8,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write daily-rolling log files into this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn label_config(&self) -> anyhow::Result<LabelConfig> {
        let mut config = match &self.config {
            Some(path) => LabelConfig::from_file(path)
                .with_context(|| format!("load config '{}'", path.display()))?,
            None => LabelConfig::default(),
        };

        if let Some(passes) = self.passes {
            config.pass_count = passes;
        }
        if let Some(hop_budget) = self.hop_budget {
            config.hop_budget = hop_budget;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if self.sequential {
            config.execution = Execution::Sequential;
        }
        if self.stop_when_stable {
            config.stop_when_stable = true;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(&LogOptions {
        base_level: cli.log_level.clone(),
        directory: cli.log_dir.clone(),
        ..Default::default()
    })?;

    let config = cli.label_config()?;
    tracing::info!(?config, "Pass configuration");

    let source = MaskSource {
        channel: cli.channel,
        threshold: cli.threshold,
    };
    let mask = ccl::io::load_mask(&cli.input, &source)
        .with_context(|| format!("read mask from '{}'", cli.input.display()))?;
    tracing::info!(
        width = mask.width(),
        height = mask.height(),
        foreground = mask.count_foreground(),
        "Mask loaded"
    );

    let driver = PassDriver::new(config).context("configure pass driver")?;
    let run = driver.run(&mask);

    if !run.report.is_stable() {
        tracing::warn!(
            "Last pass still changed labels; some components may carry several labels. \
             Increase --passes or --hop-budget to be sure."
        );
    }

    let components = run.labels.components();
    tracing::info!(components = components.len(), "Components labeled");
    if let Some(largest) = components.iter().max_by_key(|c| c.area) {
        tracing::info!(
            label = largest.label,
            area = largest.area,
            bbox_width = largest.bbox_width(),
            bbox_height = largest.bbox_height(),
            "Largest component"
        );
    }

    if let Some(parent) = cli.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    ccl::io::save_labels(&cli.out, &run.labels)
        .with_context(|| format!("write labels to '{}'", cli.out.display()))?;

    tracing::info!(path = %cli.out.display(), "Wrote labels");
    Ok(())
}
