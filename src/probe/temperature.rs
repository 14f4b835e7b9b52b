// CPU temperature sources and the background sampler

use parking_lot::Mutex;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use sysinfo::Components;

/// Readings at or below this are treated as sensor garbage
pub const MIN_PLAUSIBLE_CELSIUS: f64 = -50.0;
/// Readings at or above this are treated as sensor garbage
pub const MAX_PLAUSIBLE_CELSIUS: f64 = 150.0;
/// Default sampling period of the background thread
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
/// Optional helper module exporting `double GetCpuTemperature()`
pub const WRAPPER_LIBRARY: &str = "LibreHardwareMonitorWrapper.dll";

/// Something that can report the current CPU temperature in Celsius.
/// Implementations may fail on every call; the sampler just keeps trying.
pub trait TemperatureSource: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Reads the current temperature, `None` if not available right now
    fn read(&mut self) -> Option<f64>;
}

/// Source that never reports anything.
pub struct NullTemperatureSource;

impl TemperatureSource for NullTemperatureSource {
    fn name(&self) -> &str {
        "none"
    }

    fn read(&mut self) -> Option<f64> {
        None
    }
}

/// Tries each source in order and returns the first reading.
pub struct ChainedTemperatureSource {
    sources: Vec<Box<dyn TemperatureSource>>,
}

impl ChainedTemperatureSource {
    pub fn new(sources: Vec<Box<dyn TemperatureSource>>) -> Self {
        Self { sources }
    }
}

impl TemperatureSource for ChainedTemperatureSource {
    fn name(&self) -> &str {
        "chain"
    }

    fn read(&mut self) -> Option<f64> {
        self.sources.iter_mut().find_map(|s| s.read())
    }
}

/// Averages the CPU-related hardware sensors exposed through sysinfo.
pub struct ComponentTemperatureSource {
    components: Components,
}

impl ComponentTemperatureSource {
    /// Returns `None` when the machine exposes no CPU-like sensor.
    pub fn detect() -> Option<Self> {
        let components = Components::new_with_refreshed_list();
        let has_cpu_sensor = components
            .list()
            .iter()
            .any(|c| is_cpu_sensor_label(c.label()));
        has_cpu_sensor.then_some(Self { components })
    }
}

impl TemperatureSource for ComponentTemperatureSource {
    fn name(&self) -> &str {
        "sysinfo components"
    }

    fn read(&mut self) -> Option<f64> {
        self.components.refresh(true);
        let temps: Vec<f32> = self
            .components
            .list()
            .iter()
            .filter(|c| is_cpu_sensor_label(c.label()))
            .filter_map(|c| c.temperature())
            .collect();
        average(&temps)
    }
}

/// Runs `sensors` (lm-sensors) and averages the CPU package/core lines.
pub struct SensorsCommandSource {
    pattern: Option<Regex>,
}

impl SensorsCommandSource {
    pub fn new() -> Self {
        // Matches values like +47.0°C or +47°C
        Self {
            pattern: Regex::new(r"\+([0-9]+(?:\.[0-9]+)?)°C").ok(),
        }
    }
}

impl TemperatureSource for SensorsCommandSource {
    fn name(&self) -> &str {
        "sensors command"
    }

    fn read(&mut self) -> Option<f64> {
        let pattern = self.pattern.as_ref()?;
        let output = std::process::Command::new("sensors").output().ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        parse_sensors_output(&text, pattern)
    }
}

/// Extracts the average CPU temperature from `sensors` output.
fn parse_sensors_output(text: &str, pattern: &Regex) -> Option<f64> {
    let temps: Vec<f32> = text
        .lines()
        .filter(|line| is_cpu_sensor_label(line))
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f32>().ok())
        .collect();
    average(&temps)
}

fn is_cpu_sensor_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    ["tctl", "tdie", "package", "core", "cpu"]
        .iter()
        .any(|key| lower.contains(key))
}

fn average(values: &[f32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64)
}

/// Places where the helper module is looked for, in probing order.
/// The last candidate is the bare file name, resolved by the OS search path.
///
/// # Arguments
/// * `exe_dir` - directory of the running executable
/// * `file_name` - library file name
pub fn library_candidates(exe_dir: &Path, file_name: &str) -> Vec<PathBuf> {
    vec![
        exe_dir.join("dll").join(file_name),
        exe_dir.join("libs").join(file_name),
        exe_dir.join("..").join("libs").join(file_name),
        exe_dir.join(file_name),
        PathBuf::from(file_name),
    ]
}

/// Loads the optional helper module on demand and calls its export.
/// Loading is retried on every read until it succeeds once.
#[cfg(windows)]
pub struct LibraryTemperatureSource {
    candidates: Vec<PathBuf>,
    export: Option<unsafe extern "C" fn() -> f64>,
}

#[cfg(windows)]
impl LibraryTemperatureSource {
    pub fn new() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        Self {
            candidates: library_candidates(&exe_dir, WRAPPER_LIBRARY),
            export: None,
        }
    }

    fn load(&self) -> Option<unsafe extern "C" fn() -> f64> {
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Foundation::FreeLibrary;
        use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

        for path in &self.candidates {
            let wide: Vec<u16> = path
                .as_os_str()
                .encode_wide()
                .chain(std::iter::once(0))
                .collect();
            let module = unsafe { LoadLibraryW(wide.as_ptr()) };
            if module.is_null() {
                continue;
            }
            let proc = unsafe { GetProcAddress(module, c"GetCpuTemperature".as_ptr().cast()) };
            let Some(proc) = proc else {
                tracing::debug!(path = %path.display(), "module has no GetCpuTemperature export");
                unsafe { FreeLibrary(module) };
                continue;
            };
            tracing::info!(path = %path.display(), "loaded temperature module");
            // The export has the signature `double GetCpuTemperature(void)`
            return Some(unsafe {
                std::mem::transmute::<unsafe extern "system" fn() -> isize, unsafe extern "C" fn() -> f64>(proc)
            });
        }
        None
    }
}

#[cfg(windows)]
impl TemperatureSource for LibraryTemperatureSource {
    fn name(&self) -> &str {
        WRAPPER_LIBRARY
    }

    fn read(&mut self) -> Option<f64> {
        if self.export.is_none() {
            self.export = self.load();
        }
        self.export.map(|f| unsafe { f() })
    }
}

/// Builds the platform's default chain of temperature sources.
pub fn default_source() -> Box<dyn TemperatureSource> {
    let mut sources: Vec<Box<dyn TemperatureSource>> = Vec::new();
    #[cfg(windows)]
    sources.push(Box::new(LibraryTemperatureSource::new()));
    if let Some(components) = ComponentTemperatureSource::detect() {
        sources.push(Box::new(components));
    }
    #[cfg(target_os = "linux")]
    sources.push(Box::new(SensorsCommandSource::new()));
    chain_or_null(sources)
}

/// Collapses a source list: none gives [`NullTemperatureSource`], one is
/// used as is, more are chained in order.
pub fn chain_or_null(mut sources: Vec<Box<dyn TemperatureSource>>) -> Box<dyn TemperatureSource> {
    match sources.len() {
        0 => Box::new(NullTemperatureSource),
        1 => sources.remove(0),
        _ => Box::new(ChainedTemperatureSource::new(sources)),
    }
}

const UNAVAILABLE: i32 = i32::MIN;

/// Latest plausible temperature in whole degrees. Last write wins.
#[derive(Debug)]
pub struct TemperatureSlot {
    value: AtomicI32,
}

impl Default for TemperatureSlot {
    fn default() -> Self {
        Self {
            value: AtomicI32::new(UNAVAILABLE),
        }
    }
}

impl TemperatureSlot {
    /// Stores `celsius` if it lies strictly inside the plausible range.
    /// Returns false when the reading was discarded.
    pub fn publish(&self, celsius: f64) -> bool {
        if !(celsius > MIN_PLAUSIBLE_CELSIUS && celsius < MAX_PLAUSIBLE_CELSIUS) {
            return false;
        }
        self.value.store(celsius as i32, Ordering::Relaxed);
        true
    }

    /// Last accepted value, `None` until a reading has been accepted.
    pub fn latest(&self) -> Option<i32> {
        match self.value.load(Ordering::Relaxed) {
            UNAVAILABLE => None,
            v => Some(v),
        }
    }
}

/// Reads the source once and publishes a plausible result.
pub fn sample_once(source: &mut dyn TemperatureSource, slot: &TemperatureSlot) {
    if let Some(celsius) = source.read() {
        if !slot.publish(celsius) {
            tracing::trace!(celsius, source = source.name(), "discarded implausible temperature");
        }
    }
}

/// Owns the perpetual sampling thread. The thread is started by the first
/// call to [`TemperatureSampler::latest`] and lives as long as the process.
pub struct TemperatureSampler {
    slot: Arc<TemperatureSlot>,
    pending_source: Mutex<Option<Box<dyn TemperatureSource>>>,
    interval: Duration,
}

impl TemperatureSampler {
    pub fn new(source: Box<dyn TemperatureSource>) -> Self {
        Self::with_interval(source, SAMPLE_INTERVAL)
    }

    pub fn with_interval(source: Box<dyn TemperatureSource>, interval: Duration) -> Self {
        Self {
            slot: Arc::new(TemperatureSlot::default()),
            pending_source: Mutex::new(Some(source)),
            interval,
        }
    }

    /// Returns the latest sample without blocking, starting the sampler if needed.
    pub fn latest(&self) -> Option<i32> {
        self.ensure_started();
        self.slot.latest()
    }

    pub fn is_started(&self) -> bool {
        self.pending_source.lock().is_none()
    }

    fn ensure_started(&self) {
        let Some(mut source) = self.pending_source.lock().take() else {
            return;
        };
        let slot = Arc::clone(&self.slot);
        let interval = self.interval;
        let name = source.name().to_string();
        let spawned = std::thread::Builder::new()
            .name("temperature-sampler".into())
            .spawn(move || {
                loop {
                    sample_once(source.as_mut(), &slot);
                    std::thread::sleep(interval);
                }
            });
        match spawned {
            Ok(_) => tracing::debug!(source = %name, "temperature sampler started"),
            Err(e) => tracing::warn!(error = %e, "could not start temperature sampler"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Instant;

    struct ScriptedSource {
        readings: VecDeque<Option<f64>>,
    }

    impl ScriptedSource {
        fn new(readings: &[Option<f64>]) -> Self {
            Self {
                readings: readings.iter().copied().collect(),
            }
        }
    }

    impl TemperatureSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn read(&mut self) -> Option<f64> {
            self.readings.pop_front().flatten()
        }
    }

    #[test]
    fn slot_starts_unavailable() {
        assert_eq!(TemperatureSlot::default().latest(), None);
    }

    #[test]
    fn out_of_range_readings_keep_previous_value() {
        let slot = TemperatureSlot::default();
        let mut source = ScriptedSource::new(&[
            Some(200.0),
            Some(41.7),
            Some(150.0),
            None,
            Some(-50.0),
            Some(f64::NAN),
        ]);

        sample_once(&mut source, &slot);
        assert_eq!(slot.latest(), None);

        for _ in 0..5 {
            sample_once(&mut source, &slot);
            assert_eq!(slot.latest(), Some(41));
        }
    }

    #[test]
    fn range_bounds_are_exclusive() {
        let slot = TemperatureSlot::default();
        assert!(!slot.publish(-50.0));
        assert!(slot.publish(-49.5));
        assert!(slot.publish(149.9));
        assert!(!slot.publish(150.0));
        assert_eq!(slot.latest(), Some(149));
    }

    #[test]
    fn chain_returns_first_reading() {
        let mut chain = ChainedTemperatureSource::new(vec![
            Box::new(NullTemperatureSource) as Box<dyn TemperatureSource>,
            Box::new(ScriptedSource::new(&[Some(55.0)])),
            Box::new(ScriptedSource::new(&[Some(70.0)])),
        ]);
        assert_eq!(chain.read(), Some(55.0));
    }

    #[test]
    fn empty_source_list_falls_back_to_null() {
        let mut source = chain_or_null(Vec::new());
        assert_eq!(source.name(), "none");
        assert_eq!(source.read(), None);

        let mut single =
            chain_or_null(vec![Box::new(ScriptedSource::new(&[Some(42.0)])) as Box<dyn TemperatureSource>]);
        assert_eq!(single.name(), "scripted");
        assert_eq!(single.read(), Some(42.0));

        let chained = chain_or_null(vec![
            Box::new(NullTemperatureSource) as Box<dyn TemperatureSource>,
            Box::new(ScriptedSource::new(&[Some(42.0)])),
        ]);
        assert_eq!(chained.name(), "chain");
    }

    #[test]
    fn null_source_reports_unavailable() {
        let sampler =
            TemperatureSampler::with_interval(Box::new(NullTemperatureSource), Duration::from_millis(5));
        assert_eq!(sampler.latest(), None);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(sampler.latest(), None);
    }

    #[test]
    fn sampler_starts_lazily_and_publishes() {
        let sampler = TemperatureSampler::with_interval(
            Box::new(ScriptedSource::new(&[Some(63.2)])),
            Duration::from_millis(5),
        );
        assert!(!sampler.is_started());

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = sampler.latest();
        assert!(sampler.is_started());
        while seen.is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            seen = sampler.latest();
        }
        assert_eq!(seen, Some(63));
    }

    #[test]
    fn parses_cpu_lines_from_sensors() {
        let text = "\
k10temp-pci-00c3
Adapter: PCI adapter
Tctl:         +50.0°C
Tdie:         +48.0°C

nvme-pci-0100
Composite:    +38.9°C  (low  = -273.1°C, high = +84.8°C)
";
        let pattern = Regex::new(r"\+([0-9]+(?:\.[0-9]+)?)°C").unwrap();
        assert_eq!(parse_sensors_output(text, &pattern), Some(49.0));
        assert_eq!(parse_sensors_output("Composite: +38.9°C", &pattern), None);
    }

    #[test]
    fn library_candidates_order() {
        let dir = Path::new("app");
        let c = library_candidates(dir, WRAPPER_LIBRARY);
        assert_eq!(c.len(), 5);
        assert_eq!(c[0], dir.join("dll").join(WRAPPER_LIBRARY));
        assert_eq!(c[1], dir.join("libs").join(WRAPPER_LIBRARY));
        assert_eq!(c[2], dir.join("..").join("libs").join(WRAPPER_LIBRARY));
        assert_eq!(c[3], dir.join(WRAPPER_LIBRARY));
        assert_eq!(c[4], PathBuf::from(WRAPPER_LIBRARY));
    }
}
