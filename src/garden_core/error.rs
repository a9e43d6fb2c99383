use thiserror::Error;

use crate::garden_core::catalogue::PlantId;
use crate::garden_core::instance::InstanceId;

#[derive(Debug, Error)]
pub enum GardenError {
    #[error("unknown plant {0}")]
    UnknownPlant(PlantId),

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),

    #[error("no page at index {0}")]
    NoSuchPage(usize),

    #[error("a project must keep at least one page")]
    LastPage,

    #[error("height map has {samples} samples for resolution {resolution}")]
    InconsistentTerrain { resolution: usize, samples: usize },

    #[error("unsupported project format version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid project file: {0}")]
    InvalidProject(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GardenResult<T> = Result<T, GardenError>;
