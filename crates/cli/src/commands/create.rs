use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use cluster::KubectlClient;
use console::style;
use edge::{CloudflareClient, DnsProvider, IngressDevice, UnifiClient};
use events::EventBus;
use orchestrator::{
    management_registry, CancellationHandle, EventBusReporter, FanoutReporter,
    OrderedEventEmitter, PhaseServices, ProvisionReport, Provisioner, RunContext,
};
use platform_core::{Catalog, ProvisionInputs};
use tracing::{debug, info, warn};

use crate::args::{CreateArgs, OutputFormat};
use crate::reporter::{format_elapsed, ConsoleStepReporter};
use crate::settings::{self, FileSettings};

/// Exit status used when the run is interrupted.
const EXIT_CANCELLED: u8 = 130;

pub async fn run(args: CreateArgs) -> Result<ExitCode> {
    let file = FileSettings::load(args.config.as_deref())?;
    let mut inputs = settings::resolve_inputs(&args, &file);
    inputs.kubeconfig_path =
        settings::expand_home(&inputs.kubeconfig_path, dirs::home_dir().as_deref());

    let log_path = crate::logging::init(inputs.ci)?;
    debug!(inputs = ?inputs, "Resolved inputs");

    let catalog = match args.catalog_file.as_ref().or(file.catalog_file.as_ref()) {
        Some(path) => settings::load_catalog(path)?,
        None => Catalog::builtin(),
    };

    let services = PhaseServices {
        dns: dns_provider(),
        ingress_device: ingress_device(&inputs)?,
    };
    let registry = Arc::new(management_registry(services).context("Failed to assemble phases")?);
    let cluster = Arc::new(KubectlClient::new(&inputs.kubeconfig_path));

    let handle = CancellationHandle::new();
    let ctx = RunContext::new(handle.signal());

    let bus = EventBus::new();
    spawn_event_log(&bus, &ctx);
    let reporter = FanoutReporter::new()
        .with(Arc::new(ConsoleStepReporter::new(inputs.ci)))
        .with(Arc::new(EventBusReporter::new(
            OrderedEventEmitter::new(bus),
            ctx.run_id(),
        )));

    let estimated: u32 = registry.iter().map(|p| p.estimated_minutes()).sum();
    print_banner(&inputs, &log_path, estimated);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling provisioning");
            handle.cancel();
        }
    });

    let provisioner = Provisioner::new(registry, cluster, Arc::new(reporter));
    match provisioner.provision(&ctx, &inputs, &catalog).await {
        Ok(report) => {
            info!(run_id = %report.run_id, state = %report.state, "Run finished");
            print_report(&report, args.output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("{} {}", style("Cancelled:").yellow().bold(), e);
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("See {} for details", log_path.display())).dim()
            );
            Err(e).context("failed to create harvester management cluster")
        }
    }
}

fn dns_provider() -> Option<Arc<dyn DnsProvider>> {
    match CloudflareClient::from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "No DNS credentials; DNS records will not be published");
            None
        }
    }
}

fn ingress_device(inputs: &ProvisionInputs) -> Result<Option<Arc<dyn IngressDevice>>> {
    // A host without a password is rejected by the configuration gate
    let (Some(host), Some(password)) = (&inputs.unifi_host, &inputs.unifi_password) else {
        return Ok(None);
    };
    let client = UnifiClient::new(host, &inputs.unifi_user, password)
        .context("Failed to build UniFi client")?;
    Ok(Some(Arc::new(client)))
}

fn spawn_event_log(bus: &EventBus, ctx: &RunContext) {
    let mut observer = bus.observe_run(ctx.run_id());
    tokio::spawn(async move {
        while let Some(envelope) = observer.next().await {
            debug!(
                sequence = envelope.sequence,
                event = ?envelope.event,
                "Step event"
            );
        }
        if observer.skipped() > 0 {
            warn!(skipped = observer.skipped(), "Run log is missing step events");
        }
    });
}

fn print_banner(inputs: &ProvisionInputs, log_path: &Path, estimated_minutes: u32) {
    println!();
    println!(
        "{} {}",
        style("kubefirst on Harvester:").bold(),
        style(&inputs.cluster_name).cyan()
    );
    println!("  Log file:       {}", log_path.display());
    println!("  Estimated time: ~{} min", estimated_minutes);
    if let Some(phase) = &inputs.stop_after {
        println!("  Stopping after: {}", phase);
    }
    println!();
}

fn print_report(report: &ProvisionReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!(
                "{} phases completed in {}",
                report.phases.len(),
                format_elapsed(std::time::Duration::from_millis(report.elapsed_ms))
            );
            if let Some(phase) = &report.halted_at {
                println!("Re-run without --stop-after to continue past {}", phase);
            }
        }
    }
    Ok(())
}
