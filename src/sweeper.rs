use crate::services::StagingFileService;
use chrono::Duration;
use parking_lot::Mutex;
use std::sync::Arc;

/// Periodically removes expired staging files.
/// Staging files never promoted into permanent files would otherwise pile up.
pub struct StagingFileSweeper {
    period: Duration,
    expiration: Duration,
    staging_file_service: Arc<StagingFileService>,
    stop_signal_sender: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    task_join_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StagingFileSweeper {
    pub fn new(
        period: Duration,
        expiration: Duration,
        staging_file_service: Arc<StagingFileService>,
    ) -> Self {
        StagingFileSweeper {
            period,
            expiration,
            staging_file_service,
            stop_signal_sender: Mutex::new(None),
            task_join_handle: Mutex::new(None),
        }
    }

    /// Spawns the sweep task. Calling it again replaces the previous task's
    /// handles, so stop the sweeper first.
    pub fn start(&self) {
        let period = self.period;
        let expiration = self.expiration;

        log::info!(target: "sweeper", period:%, expiration:%; "Starting staging file sweeper.");

        let (stop_signal_sender, stop_signal_receiver) = tokio::sync::oneshot::channel();

        let task_join_handle = tokio::spawn(remove_expired_staging_files_task(
            stop_signal_receiver,
            period,
            expiration,
            self.staging_file_service.clone(),
        ));

        let mut stop_signal_sender_lock = self.stop_signal_sender.lock();
        *stop_signal_sender_lock = Some(stop_signal_sender);
        drop(stop_signal_sender_lock);

        let mut task_join_handle_lock = self.task_join_handle.lock();
        *task_join_handle_lock = Some(task_join_handle);
        drop(task_join_handle_lock);

        log::info!(target: "sweeper", "Staging file sweeper started.");
    }

    /// Signals the sweep task to stop and waits for it to finish.
    pub async fn stop(&self) {
        log::info!(target: "sweeper", "Shutting down staging file sweeper.");

        let task_join_handle = {
            let mut stop_signal_sender_lock = self.stop_signal_sender.lock();
            let stop_signal_sender = stop_signal_sender_lock.take();
            drop(stop_signal_sender_lock);

            if let Some(stop_signal_sender) = stop_signal_sender {
                stop_signal_sender.send(()).ok();
            }

            let mut task_join_handle_lock = self.task_join_handle.lock();
            let task_join_handle = task_join_handle_lock.take();
            drop(task_join_handle_lock);

            task_join_handle
        };

        if let Some(task_join_handle) = task_join_handle {
            task_join_handle.await.ok();
        }

        log::info!(target: "sweeper", "Staging file sweeper shut down.");
    }
}

async fn remove_expired_staging_files_task(
    mut stop_signal_receiver: tokio::sync::oneshot::Receiver<()>,
    period: Duration,
    expiration: Duration,
    staging_file_service: Arc<StagingFileService>,
) {
    let period = match period.to_std() {
        Ok(period) => period,
        Err(err) => {
            log::warn!(target: "sweeper", err:err; "Failed to convert period to std duration. Defaulting to 1 hour.");
            std::time::Duration::new(3600, 0)
        }
    };

    loop {
        tokio::select! {
            _ = tokio::time::sleep(period) => {
                remove_expired_staging_files(expiration, &staging_file_service).await;
            }
            _ = &mut stop_signal_receiver => {
                break;
            }
        }
    }
}

async fn remove_expired_staging_files(
    expiration: Duration,
    staging_file_service: &StagingFileService,
) {
    log::info!(target: "sweeper", expiration:%; "Removing expired staging files.");

    let result = staging_file_service
        .remove_expired_staging_files(expiration)
        .await;

    match result {
        Ok(removed_count) => {
            log::info!(target: "sweeper", expiration:%, removed_count; "Removed expired staging files.");
        }
        Err(err) => {
            // a missed sweep is made up for by the next one
            log::warn!(target: "sweeper", err:err; "Failed to remove expired staging files.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::create_test_services;

    #[tokio::test]
    async fn test_sweeper_removes_expired_staging_files() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let staging_file_service = &services.staging_file_service;

        let staging_file = staging_file_service
            .create_staging_file("staged", None, 16)
            .await
            .unwrap();

        let sweeper = StagingFileSweeper::new(
            Duration::milliseconds(50),
            // future cutoff, so the fresh row counts as expired immediately
            Duration::seconds(-5),
            staging_file_service.clone(),
        );

        sweeper.start();
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        sweeper.stop().await;

        let raw_staging_file = staging_file_service
            .get_staging_file_by_id(staging_file.id)
            .await
            .unwrap();

        assert_eq!(raw_staging_file, None);
    }
}
