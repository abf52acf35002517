//! Stderr bridge example
//!
//! Routes legacy file-logger calls, a structured channel and an unhandled
//! error through the process-wide manager. Every JSON line lands on stderr;
//! the narration goes to stdout.
//!
//! Run with: CONTAINER_LOGS_LEVEL=info cargo run --example stderr_bridge

use container_logs::legacy::LegacyConf;
use container_logs::prelude::*;
use container_logs::{context, warning};
use std::sync::Arc;

#[derive(Debug)]
struct RuntimeError(String);

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RuntimeError {}

fn main() -> Result<()> {
    println!("=== Container Logs - Stderr Bridge Example ===\n");

    let manager = LogManager::global();

    println!("1. Legacy file logger, threshold WARNING:");
    let drivers = LegacyDrivers::with_stderr_shim(Arc::clone(&manager));
    let mut conf = LegacyConf::new();
    conf.insert("timeFormat".to_string(), "%b %d %H:%M:%S".to_string());
    if let Some(mut legacy) = drivers.create(
        "file",
        "/var/www/files/ConfigAndLog/CiviCRM.log",
        "civicrm",
        conf,
        PearPriority::Warning,
    ) {
        legacy.open();
        let written = legacy.debug("cache miss (hidden)".into());
        println!("   debug accepted: {written}");
        let written = legacy.log("mailing {id} bounced".into(), "err".into());
        println!("   err accepted: {written}");
        legacy.close();
    }

    println!("\n2. Structured channel with placeholders:");
    let cron = manager.get_log("cron");
    cron.info(
        "Scheduled job {job} finished in {ms}ms",
        context! { "job" => "civimail", "ms" => 184 },
    )?;
    warning!(cron, "{} jobs still queued", 3)?;

    println!("\n3. Unhandled error:");
    let interceptor = ExceptionInterceptor::new(Arc::clone(&manager));
    let delivery = interceptor.report(&RuntimeError("boom".to_string()));
    println!("   delivered via {delivery:?}");

    let metrics = manager.metrics();
    println!(
        "\nprimary deliveries: {}, fallback deliveries: {}, filtered: {}",
        metrics.primary_deliveries(),
        metrics.fallback_deliveries(),
        metrics.filtered()
    );
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
