use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Unix permission bits, written as an octal string (`"0775"`) in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode(pub u32);

impl Mode {
    pub fn bits(self) -> u32 {
        self.0
    }

    /// True if every permission bit set in `other` is also set here, and
    /// at least one more bit is.
    pub fn is_more_permissive_than(self, other: Mode) -> bool {
        self.0 & other.0 == other.0 && self.0 != other.0
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{:04o}", self.0))
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        let digits = raw.trim_start_matches("0o");
        u32::from_str_radix(digits, 8)
            .map(Mode)
            .map_err(|_| serde::de::Error::custom(format!("invalid octal mode '{raw}'")))
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_unit_dir")]
    pub unit_dir: PathBuf,
    /// Unit template, relative to the source directory. A built-in unit is
    /// rendered when the file is absent.
    #[serde(default = "default_unit_template")]
    pub unit_template: PathBuf,
    #[serde(default = "default_user_placeholder")]
    pub user_placeholder: String,
    /// Number of journal lines captured when the service misbehaves.
    #[serde(default = "default_log_lines")]
    pub log_lines: u32,
}

fn default_service_name() -> String {
    "hydepark-sync".to_string()
}

fn default_unit_dir() -> PathBuf {
    PathBuf::from("/etc/systemd/system")
}

fn default_unit_template() -> PathBuf {
    PathBuf::from("systemd/hydepark-sync.service")
}

fn default_user_placeholder() -> String {
    "YOUR_USERNAME".to_string()
}

fn default_log_lines() -> u32 {
    50
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            unit_dir: default_unit_dir(),
            unit_template: default_unit_template(),
            user_placeholder: default_user_placeholder(),
            log_lines: default_log_lines(),
        }
    }
}

impl ServiceConfig {
    pub fn unit_file_name(&self) -> String {
        format!("{}.service", self.name)
    }

    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(self.unit_file_name())
    }
}

// ---------------------------------------------------------------------------
// LayoutConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(default = "default_venv_dir")]
    pub venv_dir: String,
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[serde(default = "default_staged_dirs")]
    pub staged_dirs: Vec<String>,
    #[serde(default = "default_staged_files")]
    pub staged_files: Vec<String>,
    /// Subset of the staged items refreshed by a quick update.
    #[serde(default = "default_update_dirs")]
    pub update_dirs: Vec<String>,
    #[serde(default = "default_update_files")]
    pub update_files: Vec<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_data_subdirs")]
    pub data_subdirs: Vec<String>,
    /// JSON array stores created empty at install time. The first one is the
    /// workers store checked by the verifier.
    #[serde(default = "default_data_files")]
    pub data_files: Vec<String>,
    #[serde(default = "default_dir_mode")]
    pub dir_mode: Mode,
    #[serde(default = "default_file_mode")]
    pub file_mode: Mode,
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("/opt/hydepark-sync")
}

fn default_venv_dir() -> String {
    "venv".to_string()
}

fn default_entry_point() -> String {
    "main.py".to_string()
}

fn default_config_file() -> String {
    "config.py".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_staged_dirs() -> Vec<String> {
    strings(&["api", "processors", "dashboard", "utils", "systemd"])
}

fn default_staged_files() -> Vec<String> {
    strings(&["main.py", "config.py", "database.py", "requirements.txt"])
}

fn default_update_dirs() -> Vec<String> {
    strings(&["api", "processors", "dashboard", "utils"])
}

fn default_update_files() -> Vec<String> {
    strings(&["main.py", "config.py", "database.py"])
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_data_subdirs() -> Vec<String> {
    strings(&["faces", "id_cards"])
}

fn default_data_files() -> Vec<String> {
    strings(&["workers.json", "request_logs.json"])
}

fn default_dir_mode() -> Mode {
    Mode(0o775)
}

fn default_file_mode() -> Mode {
    Mode(0o664)
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            venv_dir: default_venv_dir(),
            entry_point: default_entry_point(),
            config_file: default_config_file(),
            staged_dirs: default_staged_dirs(),
            staged_files: default_staged_files(),
            update_dirs: default_update_dirs(),
            update_files: default_update_files(),
            data_dir: default_data_dir(),
            data_subdirs: default_data_subdirs(),
            data_files: default_data_files(),
            dir_mode: default_dir_mode(),
            file_mode: default_file_mode(),
        }
    }
}

impl LayoutConfig {
    pub fn venv_path(&self) -> PathBuf {
        self.install_dir.join(&self.venv_dir)
    }

    pub fn venv_python(&self) -> PathBuf {
        self.venv_path().join("bin/python")
    }

    pub fn venv_pip(&self) -> PathBuf {
        self.venv_path().join("bin/pip")
    }

    pub fn data_path(&self) -> PathBuf {
        self.install_dir.join(&self.data_dir)
    }

    pub fn workers_store(&self) -> Option<PathBuf> {
        self.data_files.first().map(|f| self.data_path().join(f))
    }

    pub fn config_path(&self) -> PathBuf {
        self.install_dir.join(&self.config_file)
    }
}

// ---------------------------------------------------------------------------
// PackagesConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// OS package manager; its presence is the supported-host check.
    #[serde(default = "default_manager")]
    pub manager: String,
    #[serde(default = "default_system_packages")]
    pub system: Vec<String>,
    /// Installed first; everything after it builds against it.
    #[serde(default = "default_foundation")]
    pub foundation: Vec<String>,
    #[serde(default = "default_face_stack")]
    pub face_stack: Vec<String>,
    /// Tried in order until one installs. All failing is a warning only.
    #[serde(default = "default_model_data_sources")]
    pub model_data_sources: Vec<String>,
    #[serde(default = "default_vision")]
    pub vision: Vec<String>,
    #[serde(default = "default_requirements")]
    pub requirements: String,
    #[serde(default = "default_verify_imports")]
    pub verify_imports: Vec<String>,
}

fn default_manager() -> String {
    "apt-get".to_string()
}

fn default_system_packages() -> Vec<String> {
    strings(&[
        "python3",
        "python3-pip",
        "python3-venv",
        "python3-dev",
        "build-essential",
        "cmake",
        "pkg-config",
        "libopenblas-dev",
        "liblapack-dev",
        "libx11-dev",
        "libgtk-3-dev",
        "libssl-dev",
        "libffi-dev",
        "curl",
        "lsof",
        "net-tools",
    ])
}

fn default_foundation() -> Vec<String> {
    strings(&["numpy"])
}

fn default_face_stack() -> Vec<String> {
    strings(&["dlib", "face_recognition"])
}

fn default_model_data_sources() -> Vec<String> {
    strings(&[
        "face_recognition_models",
        "git+https://github.com/ageitgey/face_recognition_models",
        "https://github.com/ageitgey/face_recognition_models/archive/refs/heads/master.zip",
    ])
}

fn default_vision() -> Vec<String> {
    strings(&["opencv-python==4.8.1.78"])
}

fn default_requirements() -> String {
    "requirements.txt".to_string()
}

fn default_verify_imports() -> Vec<String> {
    strings(&["numpy", "cv2", "face_recognition", "flask"])
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            manager: default_manager(),
            system: default_system_packages(),
            foundation: default_foundation(),
            face_stack: default_face_stack(),
            model_data_sources: default_model_data_sources(),
            vision: default_vision(),
            requirements: default_requirements(),
            verify_imports: default_verify_imports(),
        }
    }
}

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Firewall {
    Ufw,
    Firewalld,
}

impl Firewall {
    pub fn name(&self) -> &'static str {
        match self {
            Firewall::Ufw => "ufw",
            Firewall::Firewalld => "firewalld",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connectivity_host")]
    pub connectivity_host: String,
    #[serde(default = "default_firewalls")]
    pub firewalls: Vec<Firewall>,
}

fn default_port() -> u16 {
    8080
}

fn default_connectivity_host() -> String {
    "8.8.8.8".to_string()
}

fn default_firewalls() -> Vec<Firewall> {
    vec![Firewall::Ufw, Firewall::Firewalld]
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connectivity_host: default_connectivity_host(),
            firewalls: default_firewalls(),
        }
    }
}

impl NetworkConfig {
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }
}

// ---------------------------------------------------------------------------
// ReadinessConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_start_settle")]
    pub start_settle_secs: u64,
    #[serde(default = "default_listen_settle")]
    pub listen_settle_secs: u64,
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u32,
    #[serde(default = "default_port_interval")]
    pub port_interval_secs: u64,
    #[serde(default = "default_kill_wait")]
    pub kill_wait_secs: u64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// When false the HTTP probe is skipped rather than failed.
    #[serde(default = "default_http_probe")]
    pub http_probe: bool,
    #[serde(default = "default_accepted_statuses")]
    pub accepted_statuses: Vec<u16>,
}

fn default_start_settle() -> u64 {
    5
}

fn default_listen_settle() -> u64 {
    3
}

fn default_port_attempts() -> u32 {
    10
}

fn default_port_interval() -> u64 {
    2
}

fn default_kill_wait() -> u64 {
    2
}

fn default_http_timeout() -> u64 {
    5
}

fn default_http_probe() -> bool {
    true
}

fn default_accepted_statuses() -> Vec<u16> {
    vec![200, 302]
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            start_settle_secs: default_start_settle(),
            listen_settle_secs: default_listen_settle(),
            port_attempts: default_port_attempts(),
            port_interval_secs: default_port_interval(),
            kill_wait_secs: default_kill_wait(),
            http_timeout_secs: default_http_timeout(),
            http_probe: default_http_probe(),
            accepted_statuses: default_accepted_statuses(),
        }
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Credentials the application ships with. Reported after a deploy so the
/// operator knows what to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "123456".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeployConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl DeployConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: DeployConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.network.port == 0 {
            error("network.port must be non-zero".to_string());
        }
        if !self.layout.install_dir.is_absolute() {
            error(format!(
                "layout.install_dir '{}' must be an absolute path",
                self.layout.install_dir.display()
            ));
        }
        if self.service.name.trim().is_empty() {
            error("service.name must not be empty".to_string());
        }
        if self.readiness.port_attempts == 0 {
            error("readiness.port_attempts must be at least 1".to_string());
        }

        let mut warn = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message,
            })
        };

        if !self
            .layout
            .dir_mode
            .is_more_permissive_than(self.layout.file_mode)
        {
            warn(format!(
                "layout.dir_mode {:04o} is not more permissive than layout.file_mode {:04o}",
                self.layout.dir_mode.bits(),
                self.layout.file_mode.bits()
            ));
        }
        if self.packages.system.is_empty() {
            warn("packages.system is empty; no OS packages will be installed".to_string());
        }
        for item in &self.layout.update_dirs {
            if !self.layout.staged_dirs.contains(item) {
                warn(format!(
                    "update dir '{item}' is not in layout.staged_dirs"
                ));
            }
        }
        for item in &self.layout.update_files {
            if !self.layout.staged_files.contains(item) {
                warn(format!(
                    "update file '{item}' is not in layout.staged_files"
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
