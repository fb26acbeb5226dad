pub mod progress;


pub use progress::{AggregateStatus, DeviceStatus, ProgressAggregator, ProgressConfig, SpeedRing};
