//! Health reporting.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

/// Static facts a component reports about the running service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Description {
    pub service: String,
    pub version: String,
    pub environment: String,
}

/// Anything that can describe the running service, usually its configuration.
pub trait Describe: Send + Sync {
    fn describe(&self) -> Description;
}

/// Health report: always `ok` while the process answers, plus the description.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Health {
    pub ok: bool,
    #[serde(flatten)]
    pub description: Description,
}

pub struct AppService {
    describer: Arc<dyn Describe>,
}

impl AppService {
    pub fn new(describer: Arc<dyn Describe>) -> Self {
        Self { describer }
    }

    pub fn get_health(&self) -> Health {
        Health {
            ok: true,
            description: self.describer.describe(),
        }
    }
}
