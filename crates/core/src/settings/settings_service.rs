use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::constants::LOT_TRACKING_METHOD_SETTING_KEY;
use crate::errors::Result;
use crate::lots::LotTrackingMethod;

use super::settings_traits::{SettingsRepositoryTrait, SettingsServiceTrait};

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        SettingsService {
            settings_repository,
        }
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    /// Reads the persisted lot tracking method. A setting that was never
    /// stored means FIFO; a stored value that does not parse is an error.
    fn get_tracking_method(&self) -> Result<LotTrackingMethod> {
        match self
            .settings_repository
            .get_setting(LOT_TRACKING_METHOD_SETTING_KEY)?
        {
            Some(value) if !value.trim().is_empty() => {
                Ok(LotTrackingMethod::from_str(&value)?)
            }
            _ => {
                debug!("No lot tracking method stored, using FIFO");
                Ok(LotTrackingMethod::default())
            }
        }
    }

    async fn update_tracking_method(&self, method: LotTrackingMethod) -> Result<()> {
        self.settings_repository
            .update_setting(LOT_TRACKING_METHOD_SETTING_KEY, method.as_str())
            .await
    }
}
