use crate::music_rpc::service::MusicWorkflowService;
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Periodically pull the progress of in-progress tasks from the provider
pub struct MusicSyncer {
    service: Arc<MusicWorkflowService>,
    interval: Duration,
}

impl MusicSyncer {
    pub fn new(service: Arc<MusicWorkflowService>, interval: Duration) -> Self {
        MusicSyncer { service, interval }
    }

    /// A failed round is logged and retried on the next tick
    pub fn start(self) -> JoinHandle<()> {
        info!("start music syncer, interval {:?}", self.interval);
        tokio::spawn(async move {
            let mut interval = time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match self.service.sync_music().await {
                    Ok(0) => debug!("no music task in progress"),
                    Ok(count) => info!("synced {} in-progress music tasks", count),
                    Err(e) => error!("unable to sync music tasks {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_rpc::service::tests::{fixture, provider_track, FakeProvider};
    use entity::MusicStatus;

    #[tokio::test]
    async fn syncer_finishes_tasks_in_background() {
        let f = fixture(FakeProvider::new(
            vec![provider_track("bg", "submitted")],
            Box::new(|id: &str| Some(provider_track(id, "complete"))),
        ))
        .await;
        let service = Arc::new(f.service);
        let ids = service
            .generate(
                3,
                crate::music_rpc::model::GenerateRequest {
                    generate_mode: entity::GenerateMode::Description.into(),
                    prompt: "rainy night".to_string(),
                    model: "chirp-v3-5".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let handle = MusicSyncer::new(service.clone(), Duration::from_millis(20)).start();
        let mut status = MusicStatus::InProgress;
        for _ in 0..50 {
            status = service.get(ids[0]).await.unwrap().status;
            if status == MusicStatus::Success {
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert_eq!(status, MusicStatus::Success);
    }
}
