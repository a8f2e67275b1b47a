//! Repository traits for settings.

use async_trait::async_trait;

use crate::errors::Result;
use crate::lots::LotTrackingMethod;

/// Repository trait for persisted scalar settings.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Get a single setting value by key; `None` when it was never stored.
    fn get_setting(&self, setting_key: &str) -> Result<Option<String>>;

    /// Update a single setting.
    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()>;
}

/// Trait for settings service operations
#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_tracking_method(&self) -> Result<LotTrackingMethod>;
    async fn update_tracking_method(&self, method: LotTrackingMethod) -> Result<()>;
}
