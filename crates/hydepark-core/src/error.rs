use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("unsupported host: '{0}' not found on PATH (an apt-based distribution is required)")]
    UnsupportedHost(String),

    #[error("insufficient privileges: running as uid {uid}; re-run as root (e.g. with sudo)")]
    NotRoot { uid: String },

    #[error("invalid config: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("no HTTP client available: {0}")]
    HttpClient(String),

    #[error("source directory {source_dir} is inside the install directory {install_dir}")]
    SourceInsideInstall {
        source_dir: PathBuf,
        install_dir: PathBuf,
    },

    #[error("not installed: {0} does not exist; run a full deploy first")]
    NotInstalled(PathBuf),

    #[error("missing source item: {0}")]
    MissingSource(PathBuf),

    #[error("`{program}` failed: {detail}")]
    CommandFailed { program: String, detail: String },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("python module '{module}' cannot be imported: {detail}")]
    ImportFailed { module: String, detail: String },

    #[error("service '{service}' is not active after start\n\n{logs}")]
    ServiceInactive { service: String, logs: String },

    #[error("port {port} not listening after {attempts} attempts\n\n{logs}")]
    PortNotListening {
        port: u16,
        attempts: u32,
        logs: String,
    },

    #[error("step '{step}' failed")]
    Step {
        step: String,
        #[source]
        source: Box<DeployError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
