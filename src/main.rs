use clap::Parser;
use log::{debug, error, LevelFilter};
use sessionize::cli::Cli;
use sessionize::config::build_config;
use sessionize::pipeline::run_files;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .format_target(false)
        .init();
    // The config file may turn on verbose output, so the effective level
    // is only known after it has been read.
    log::set_max_level(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let app_config = build_config(&cli);
    if app_config.verbose {
        log::set_max_level(LevelFilter::Debug);
    }
    debug!("effective config: {:?}", app_config);

    if let Err(e) = run_files(
        &cli.input,
        &cli.inactivity_period,
        &app_config.output,
        &app_config.fields,
    ) {
        error!("{}", e);
        std::process::exit(1);
    }
}
