//! Periodic retention sweep for inactive student accounts.

use chrono::{Duration, Utc};
use std::time::Duration as StdDuration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::RetentionConfig;
use crate::database::users::UserStore;

/// Spawn the background sweep, if the deployment enables one. Students whose
/// last login predates the configured cutoff are deleted; other roles are
/// never swept.
pub fn spawn_sweeper(users: UserStore, retention: RetentionConfig) {
    let Some(days) = retention.student_inactivity_days else {
        info!("Student retention sweep disabled");
        return;
    };

    let period = StdDuration::from_secs(retention.sweep_interval_secs.max(60));
    info!(
        "Student retention sweep enabled: {} days inactivity, every {:?}",
        days, period
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let cutoff = Utc::now() - Duration::days(days);
            match users.delete_inactive_students(cutoff).await {
                Ok(0) => debug!("Retention sweep: nothing to remove"),
                Ok(n) => info!("Retention sweep removed {} inactive students", n),
                Err(e) => warn!("Retention sweep failed: {}", e),
            }
        }
    });
}
