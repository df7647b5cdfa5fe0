pub mod descriptors;
pub mod discovery;
pub mod error;
pub mod reading;
pub mod status;
pub mod topics;

pub use descriptors::{METRIC_DESCRIPTORS, MetricDescriptor};
pub use discovery::{DeviceBlock, DiscoveryContext, DiscoveryMessage, DiscoveryRecord};
pub use error::{ProtocolError, ProtocolResult};
pub use reading::{SensorReading, strip_separators};
