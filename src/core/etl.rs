use crate::core::{Pipeline, RunSummary};
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor_enabled: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor_enabled,
        }
    }

    /// Runs prepare → extract → transform → load. Any error stops the run before the
    /// output file is written.
    pub fn run(&self) -> Result<RunSummary> {
        let mut monitor = RunMonitor::start(self.monitor_enabled);

        tracing::info!("Starting receipt generation...");
        self.pipeline.prepare()?;
        monitor.mark("prepare");

        tracing::info!("Reading table...");
        let records = self.pipeline.extract()?;
        tracing::info!("Read {} records", records.len());
        monitor.mark("extract");

        tracing::info!("Populating template...");
        let receipt = self.pipeline.transform(records)?;
        tracing::info!("Populated {} rows", receipt.rows);
        monitor.mark("transform");

        tracing::info!("Writing output...");
        let summary = self.pipeline.load(receipt)?;
        if summary.written {
            tracing::info!("Output saved to: {}", summary.output_path.display());
        }
        monitor.mark("load");
        monitor.finish();

        Ok(summary)
    }
}
