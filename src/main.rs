use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use sentiment_trainer::{
    cli::{BootstrapOutcome, Cli, bootstrap, write_report},
    config::TrainerConfig,
    evaluation::CrossValidationSummary,
    observability,
};

/// コーパス未指定で終了したときの終了コード。
const EXIT_MISSING_CORPUS: u8 = 2;

fn main() -> anyhow::Result<ExitCode> {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(message, "panic occurred without location information");
        }
    }));

    let cli = Cli::parse();
    let config = TrainerConfig::from_env().context("failed to load configuration")?;
    observability::init(config.log_format()).context("failed to initialize tracing")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match bootstrap(&cli, &config, &mut out)? {
        BootstrapOutcome::MissingCorpus => {
            out.flush().context("failed to flush stdout")?;
            Ok(ExitCode::from(EXIT_MISSING_CORPUS))
        }
        BootstrapOutcome::Trained(scores) => {
            let summary = CrossValidationSummary::from_scores(&scores);
            info!(
                folds = summary.folds,
                mean_macro_f_score = summary.mean_macro_f_score,
                "training finished"
            );
            write_report(&scores, config.report_format(), &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
