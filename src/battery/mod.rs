pub mod reader;
pub mod snapshot;
pub mod sysfs;

pub use reader::{BatteryReader, StaticReader};
pub use snapshot::{BatteryHealth, BatterySnapshot, ChargeStatus, PluggedSource};
pub use sysfs::SysfsReader;
