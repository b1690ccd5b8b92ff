use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{self, LevelFilter, debug, error, info};

use swgs_cnv_pipelines::cli::{parse, Command};
use swgs_cnv_pipelines::config::defs::{PipelineError, RunConfig};
use swgs_cnv_pipelines::config::settings::resolve_platform_settings;
use swgs_cnv_pipelines::pipelines::{align, cnv_calling, downsample};
use swgs_cnv_pipelines::platform::DxClient;
use swgs_cnv_pipelines::utils::system::run_datetime;


#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n sWGS CNV pipelines\n-------------\n");

    let settings = resolve_platform_settings(&args, |key| std::env::var(key).ok())?;
    info!("Using project {} on {}", settings.project, settings.api_url);

    let client = DxClient::new(settings.clone())?;
    let run_config = Arc::new(RunConfig {
        args,
        platform: settings,
        run_datetime: run_datetime(),
    });
    debug!("Run datetime {}", run_config.run_datetime);

    if let Err(e) = dispatch(run_config, &client).await {
        error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

async fn dispatch(run_config: Arc<RunConfig>, client: &DxClient) -> Result<(), PipelineError> {
    let command = run_config.args.command.clone();
    match &command {
        Command::Align(args) => align::run(run_config, client, args).await,
        Command::Downsampling(args) => downsample::run(run_config, client, args).await,
        Command::CnvCalling { op } => cnv_calling::run(run_config, client, op).await,
    }
}
