//! Daily device maintenance: the camera's face store fills up with the day's
//! captures, so every civil midnight the stored face pictures are cleared
//! for all labour employee codes.

use std::sync::Arc;

use sqlx::MySqlPool;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::device::DeviceClient;
use crate::reconcile::CivilClock;

pub fn spawn_face_cleanup(
    pool: MySqlPool,
    device: Arc<DeviceClient>,
    clock: CivilClock,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = clock.now();
            let next_midnight = clock.next_boundary_after(now, 86_400);
            let wait = (next_midnight - now).num_seconds().max(1) as u64;

            tokio::time::sleep(std::time::Duration::from_secs(wait)).await;

            run_face_cleanup(&pool, &device).await;
        }
    })
}

async fn run_face_cleanup(pool: &MySqlPool, device: &DeviceClient) {
    info!("Running daily face picture cleanup");

    let codes = match sqlx::query_scalar::<_, String>(
        "SELECT employee_no FROM workers WHERE employee_no <> ''",
    )
    .fetch_all(pool)
    .await
    {
        Ok(codes) => codes,
        Err(e) => {
            error!(error = %e, "Face cleanup could not list workers");
            return;
        }
    };

    let mut cleared = 0usize;
    for employee_no in &codes {
        match device.remove_face(employee_no).await {
            Ok(()) => cleared += 1,
            Err(e) => {
                // one stubborn code must not stop the sweep
                error!(%employee_no, error = %e, "Failed to delete face pictures");
            }
        }
    }

    info!(cleared, total = codes.len(), "Daily face picture cleanup finished");
}
