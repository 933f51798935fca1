use async_trait::async_trait;

use crate::models::RetryObject;

/// Driver and container attached to a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverInfo {
    pub driver_name: String,
    pub container_number: String,
}

/// Resolves who drives for a booking.
#[async_trait]
pub trait DriverLookup: Send + Sync {
    async fn driver_and_container(
        &self,
        tv_app_id: &str,
        existing_queue: &[RetryObject],
    ) -> anyhow::Result<DriverInfo>;
}

/// Reuses the driver and container of a queued item with the same TV app id.
pub struct QueueDriverLookup;

#[async_trait]
impl DriverLookup for QueueDriverLookup {
    async fn driver_and_container(
        &self,
        tv_app_id: &str,
        existing_queue: &[RetryObject],
    ) -> anyhow::Result<DriverInfo> {
        Ok(existing_queue
            .iter()
            .find(|item| item.tv_app_id == tv_app_id)
            .map(|item| DriverInfo {
                driver_name: item.driver_name.clone(),
                container_number: item.container_number.clone(),
            })
            .unwrap_or_default())
    }
}
