// OS queries: CPU, memory, temperature and storage

pub mod disk_scanner;
pub mod partition_table;
pub mod refresh;
pub mod system_info;
pub mod temperature;

pub use disk_scanner::{DriveEnumerator, SystemDriveEnumerator};
pub use refresh::StorageRefresher;
pub use system_info::SystemInfoProvider;
pub use temperature::TemperatureSampler;
