// CPU and summary info rows built from sysinfo queries

use crate::format::{format_bytes, format_uptime};
use crate::models::InfoRow;
use crate::probe::temperature::TemperatureSampler;
use regex::Regex;
use std::sync::Arc;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "N/A";

/// Point-in-time CPU values. Everything OS-dependent is resolved before
/// rows are built, so row building itself cannot fail.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpuSnapshot {
    pub brand: String,
    pub identifier: Option<String>,
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub max_frequency_mhz: u64,
    pub current_frequency_mhz: u64,
    pub usage_percent: f32,
}

/// Builds the CPU page rows in display order.
///
/// # Arguments
/// * `snapshot` - values queried from the OS
/// * `temperature` - latest sampled temperature in whole degrees, if any
pub fn cpu_rows(snapshot: &CpuSnapshot, temperature: Option<i32>) -> Vec<InfoRow> {
    let brand = snapshot.brand.trim();
    vec![
        InfoRow::fixed("Processor", if brand.is_empty() { UNKNOWN } else { brand }),
        InfoRow::fixed(
            "Identifier",
            snapshot.identifier.as_deref().unwrap_or(UNKNOWN),
        ),
        InfoRow::fixed(
            "Physical cores",
            snapshot
                .physical_cores
                .map(|c| c.to_string())
                .unwrap_or_else(|| UNKNOWN.into()),
        ),
        InfoRow::fixed("Total cores", snapshot.logical_cores.to_string()),
        InfoRow::fixed("Max Frequency", mhz(snapshot.max_frequency_mhz)),
        InfoRow::dynamic("Current Frequency", mhz(snapshot.current_frequency_mhz)),
        InfoRow::dynamic(
            "CPU Usage",
            format!("{:.0} %", snapshot.usage_percent.clamp(0.0, 100.0)),
        ),
        InfoRow::dynamic(
            "CPU Temperature",
            temperature
                .map(|t| format!("{} °C", t))
                .unwrap_or_else(|| "Unavailable".into()),
        ),
    ]
}

fn mhz(value: u64) -> String {
    if value == 0 {
        NOT_AVAILABLE.into()
    } else {
        format!("{} MHz", value)
    }
}

/// Values shown on the summary page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummarySnapshot {
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub host_name: Option<String>,
    pub uptime_secs: u64,
    pub total_memory: u64,
    pub used_memory: u64,
    pub processor: String,
    pub logical_cores: usize,
}

/// Builds the summary page rows in display order.
pub fn summary_rows(s: &SummarySnapshot) -> Vec<InfoRow> {
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.into());
    let processor = s.processor.trim();
    vec![
        InfoRow::fixed("Operating system", or_unknown(&s.os_name)),
        InfoRow::fixed("Version", or_unknown(&s.os_version)),
        InfoRow::fixed("Kernel", or_unknown(&s.kernel_version)),
        InfoRow::fixed("Computer name", or_unknown(&s.host_name)),
        InfoRow::dynamic("Uptime", format_uptime(s.uptime_secs)),
        InfoRow::fixed("Processor", if processor.is_empty() { UNKNOWN } else { processor }),
        InfoRow::fixed("Logical processors", s.logical_cores.to_string()),
        InfoRow::fixed("Installed memory", format_bytes(s.total_memory)),
        InfoRow::dynamic("Memory in use", format_bytes(s.used_memory)),
    ]
}

/// Pulls `Family F Model M Stepping S, Vendor` out of Linux `/proc/cpuinfo`.
pub fn parse_cpuinfo_identifier(text: &str) -> Option<String> {
    let field = |name: &str| -> Option<String> {
        let re = Regex::new(&format!(r"(?m)^{}\s*:\s*(.+)$", regex::escape(name))).ok()?;
        Some(re.captures(text)?.get(1)?.as_str().trim().to_string())
    };
    let family = field("cpu family")?;
    let model = field("model")?;
    let stepping = field("stepping")?;
    let mut id = format!("Family {} Model {} Stepping {}", family, model, stepping);
    if let Some(vendor) = field("vendor_id") {
        id.push_str(", ");
        id.push_str(&vendor);
    }
    Some(id)
}

/// Answers the info queries. Owns the sysinfo handle so CPU usage is
/// measured between consecutive polls.
pub struct SystemInfoProvider {
    system: System,
    sampler: Arc<TemperatureSampler>,
    identifier: Option<String>,
    max_frequency_mhz: u64,
}

impl SystemInfoProvider {
    /// Creates the provider and performs the first CPU refresh.
    ///
    /// # Arguments
    /// * `sampler` - temperature sampler, started on the first CPU query
    pub fn new(sampler: Arc<TemperatureSampler>) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        let identifier = processor_identifier(&system);
        let max_frequency_mhz = max_frequency_mhz(&system);
        tracing::debug!(?identifier, max_frequency_mhz, "cpu provider ready");
        Self {
            system,
            sampler,
            identifier,
            max_frequency_mhz,
        }
    }

    /// Refreshes the dynamic CPU values and returns a snapshot.
    pub fn cpu_snapshot(&mut self) -> CpuSnapshot {
        self.system.refresh_cpu_all();
        let cpus = self.system.cpus();
        let current_frequency_mhz = if cpus.is_empty() {
            0
        } else {
            cpus.iter().map(|c| c.frequency()).sum::<u64>() / cpus.len() as u64
        };
        CpuSnapshot {
            brand: cpus.first().map(|c| c.brand().to_string()).unwrap_or_default(),
            identifier: self.identifier.clone(),
            physical_cores: System::physical_core_count(),
            logical_cores: cpus.len(),
            max_frequency_mhz: self.max_frequency_mhz.max(current_frequency_mhz),
            current_frequency_mhz,
            usage_percent: self.system.global_cpu_usage(),
        }
    }

    /// Rows for the CPU page. Never blocks on the temperature sensor.
    pub fn cpu_info_rows(&mut self) -> Vec<InfoRow> {
        let snapshot = self.cpu_snapshot();
        cpu_rows(&snapshot, self.sampler.latest())
    }

    /// Refreshes memory and returns the summary values.
    pub fn summary_snapshot(&mut self) -> SummarySnapshot {
        self.system.refresh_memory();
        SummarySnapshot {
            os_name: System::name(),
            os_version: System::long_os_version().or_else(System::os_version),
            kernel_version: System::kernel_version(),
            host_name: System::host_name(),
            uptime_secs: System::uptime(),
            total_memory: self.system.total_memory(),
            used_memory: self.system.used_memory(),
            processor: self
                .system
                .cpus()
                .first()
                .map(|c| c.brand().to_string())
                .unwrap_or_default(),
            logical_cores: self.system.cpus().len(),
        }
    }
}

fn processor_identifier(system: &System) -> Option<String> {
    if let Ok(id) = std::env::var("PROCESSOR_IDENTIFIER") {
        return Some(id);
    }
    #[cfg(target_os = "linux")]
    if let Some(id) = std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|text| parse_cpuinfo_identifier(&text))
    {
        return Some(id);
    }
    system
        .cpus()
        .first()
        .map(|c| c.vendor_id().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn max_frequency_mhz(system: &System) -> u64 {
    #[cfg(target_os = "linux")]
    if let Some(khz) = std::fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
    {
        return khz / 1000;
    }
    system.cpus().iter().map(|c| c.frequency()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CpuSnapshot {
        CpuSnapshot {
            brand: "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz".into(),
            identifier: Some("Intel64 Family 6 Model 158 Stepping 10, GenuineIntel".into()),
            physical_cores: Some(6),
            logical_cores: 12,
            max_frequency_mhz: 4700,
            current_frequency_mhz: 3701,
            usage_percent: 12.6,
        }
    }

    #[test]
    fn cpu_rows_have_fixed_order_and_dynamic_flags() {
        let rows = cpu_rows(&snapshot(), Some(54));
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Processor",
                "Identifier",
                "Physical cores",
                "Total cores",
                "Max Frequency",
                "Current Frequency",
                "CPU Usage",
                "CPU Temperature"
            ]
        );
        let dynamic: Vec<_> = rows.iter().map(|r| r.is_dynamic).collect();
        assert_eq!(dynamic, [false, false, false, false, false, true, true, true]);
        assert_eq!(rows[4].value, "4700 MHz");
        assert_eq!(rows[6].value, "13 %");
        assert_eq!(rows[7].value, "54 °C");
    }

    #[test]
    fn missing_values_become_placeholders() {
        let rows = cpu_rows(&CpuSnapshot::default(), None);
        assert_eq!(rows[0].value, "Unknown");
        assert_eq!(rows[1].value, "Unknown");
        assert_eq!(rows[2].value, "Unknown");
        assert_eq!(rows[3].value, "0");
        assert_eq!(rows[4].value, "N/A");
        assert_eq!(rows[7].value, "Unavailable");
    }

    #[test]
    fn summary_rows_format_memory_and_uptime() {
        let rows = summary_rows(&SummarySnapshot {
            os_name: Some("Windows".into()),
            uptime_secs: 90_061,
            total_memory: 16 * 1_073_741_824,
            used_memory: 1536,
            ..Default::default()
        });
        let value = |label: &str| {
            rows.iter()
                .find(|r| r.label == label)
                .map(|r| r.value.clone())
                .unwrap()
        };
        assert_eq!(value("Operating system"), "Windows");
        assert_eq!(value("Kernel"), "Unknown");
        assert_eq!(value("Uptime"), "1d 1h 1m");
        assert_eq!(value("Installed memory"), "16.0 GB");
        assert_eq!(value("Memory in use"), "1.5 KB");
    }

    #[test]
    fn identifier_from_proc_cpuinfo() {
        let text = "\
processor\t: 0
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
stepping\t: 10
";
        assert_eq!(
            parse_cpuinfo_identifier(text).as_deref(),
            Some("Family 6 Model 158 Stepping 10, GenuineIntel")
        );
    }

    #[test]
    fn identifier_missing_fields() {
        assert_eq!(parse_cpuinfo_identifier("processor : 0\nBogoMIPS : 48.00\n"), None);
    }
}
