use anyhow::Result;
use tokio::sync::mpsc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::tasks::runner::{request_cycle, CycleTrigger};

/// Register one cron job per configured spec, each requesting a full
/// check cycle from the runner.
pub async fn configure_check_jobs(
    cron_specs: &[String],
    trigger: mpsc::Sender<CycleTrigger>,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let label = spec.clone();
        let tx = trigger.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let tx = tx.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::info!(target: "scheduler", cron = %cron_label, "check job triggered");
                request_cycle(&tx);
            })
        })?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "check job registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}
