pub mod autoscaling;
pub mod aws_cli;
pub mod aws_config;
pub mod error;
pub mod inventory;
pub mod output;
pub mod params;
pub mod pipeline;

pub use error::{LcFindError, LcFindResult};
pub use inventory::{InventoryClient, LaunchConfigurationRecord};
pub use params::{Query, QueryParameters, SortOrder};
pub use pipeline::find_launch_configurations;
