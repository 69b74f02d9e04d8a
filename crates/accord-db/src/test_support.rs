//! Shared test utilities for accord-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::Arc;

    use accord_core::clock::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::AccordDb;
    use crate::service::AccordService;
    use crate::trail::writer::TrailWriter;

    /// A UTC instant at minute precision.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .unwrap()
    }

    /// In-memory database with migrations applied.
    pub async fn test_db() -> AccordDb {
        AccordDb::open_local(":memory:").await.unwrap()
    }

    /// In-memory service with trail disabled, driven by a manual clock.
    pub async fn test_service() -> (AccordService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at(2026, 3, 4, 9, 0)));
        let service = AccordService::from_db(test_db().await, TrailWriter::disabled())
            .with_clock(clock.clone());
        (service, clock)
    }

    /// In-memory service writing its trail to `trail_dir`.
    pub async fn test_service_with_trail(
        trail_dir: std::path::PathBuf,
    ) -> (AccordService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at(2026, 3, 4, 9, 0)));
        let trail = TrailWriter::new(trail_dir).unwrap();
        let service = AccordService::from_db(test_db().await, trail).with_clock(clock.clone());
        (service, clock)
    }
}
