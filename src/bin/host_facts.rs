/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use host_facts::{ConfigFile, ContainerConfig, OutputFormat, ServiceContainer};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "host_facts", about = "Collect a snapshot of facts about this host")]
struct Opt {
    /// Report format (text, json, toml or html); html when writing a file
    #[structopt(long)]
    format: Option<OutputFormat>,

    /// Write the report to this file instead of printing it
    #[structopt(long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// CPU utilization sample window in milliseconds
    #[structopt(long)]
    sample_interval_ms: Option<u64>,

    /// Ceiling for CPU sampling in milliseconds
    #[structopt(long)]
    sample_ceiling_ms: Option<u64>,

    /// Interface to report as primary
    #[structopt(long)]
    primary_interface: Option<String>,

    /// Timeout for the managed identity status check in milliseconds
    #[structopt(long)]
    domain_status_timeout_ms: Option<u64>,

    /// Log collection progress to stderr
    #[structopt(short, long)]
    verbose: bool,
}

impl Opt {
    fn overrides(&self) -> ConfigFile {
        ConfigFile {
            sample_interval_ms: self.sample_interval_ms,
            sample_ceiling_ms: self.sample_ceiling_ms,
            primary_interface: self.primary_interface.clone(),
            domain_status_timeout_ms: self.domain_status_timeout_ms,
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(fallback)).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();
    init_logging(opt.verbose);

    let container = ServiceContainer::new(ContainerConfig::default());
    let config = container
        .create_configuration_provider(opt.config.as_deref(), opt.overrides())
        .get_collection_config()
        .await?;

    info!("Collecting host facts on {}", container.get_platform_name());
    let snapshot = container.create_snapshot_service().collect(&config).await;

    match &opt.output {
        Some(path) => {
            let format = opt.format.unwrap_or(OutputFormat::Html);
            let renderer = container.create_renderer(format);
            print!("{}", container.create_renderer(OutputFormat::Text).render(&snapshot)?);
            container
                .create_report_publisher()
                .publish(&snapshot, renderer.as_ref(), path)
                .await?;
            println!("\n{} report has been written to {}", format, path.display());
        }
        None => {
            let format = opt.format.unwrap_or(OutputFormat::Text);
            print!("{}", container.create_renderer(format).render(&snapshot)?);
        }
    }

    Ok(())
}
