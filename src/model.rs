use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub base_url: String,
    pub method: ScanMethod,
    pub request_timeout: Duration,
    pub tick_interval: Duration,
    pub step_increment: f64,
    pub fetch_stats: bool,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            method: ScanMethod::Post,
            request_timeout: Duration::from_secs(120),
            tick_interval: Duration::from_millis(100),
            step_increment: 1.2,
            fetch_stats: true,
            user_agent: format!("token-scan-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// How the scan request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScanMethod {
    /// `POST /api/scan` with a JSON body
    Post,
    /// `GET /api/scan/<address>`
    Get,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Complete,
    Error,
}

impl ScanState {
    /// Status badge text.
    pub fn label(self) -> &'static str {
        match self {
            ScanState::Idle => "READY",
            ScanState::Scanning => "SCANNING",
            ScanState::Complete => "COMPLETE",
            ScanState::Error => "ERROR",
        }
    }

    pub fn is_scanning(self) -> bool {
        matches!(self, ScanState::Scanning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

/// One cosmetic phase of the progress animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStep {
    pub label: &'static str,
    pub nominal_duration: Duration,
    pub icon: &'static str,
}

/// A progress step as presentation layers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLabel {
    pub icon: String,
    pub label: String,
    pub nominal_ms: u64,
}

impl From<&ProgressStep> for StepLabel {
    fn from(step: &ProgressStep) -> Self {
        Self {
            icon: step.icon.to_string(),
            label: step.label.to_string(),
            nominal_ms: step.nominal_duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    StateChanged {
        state: ScanState,
    },
    /// The step list of a new scan, all pending.
    ProgressStarted {
        steps: Vec<StepLabel>,
    },
    ProgressTick {
        percent: f64,
    },
    StepStarted {
        index: usize,
    },
    StepCompleted {
        index: usize,
    },
    Info(InfoEvent),
    ScanCompleted {
        // Box to keep ScanEvent small; payloads can be large.
        scan: Box<CompletedScan>,
    },
    ScanFailed {
        message: String,
    },
    StatsUpdated {
        stats: ScanStats,
    },
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    ScanStarted { address: String },
    ScanAlreadyRunning,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::ScanStarted { address } => format!("Scanning {address}"),
            InfoEvent::ScanAlreadyRunning => "Scan already in progress".to_string(),
        }
    }
}

/// Opaque scan payload as returned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult(serde_json::Value);

impl ScanResult {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn has_risk_assessment(&self) -> bool {
        self.0.get("risk_assessment").is_some_and(is_truthy)
    }

    pub fn mint_address(&self) -> Option<&str> {
        self.0.get("mint_address").and_then(|v| v.as_str())
    }

    pub fn token_label(&self) -> Option<String> {
        let info = self.0.get("token_info")?;
        let name = info.get("name").and_then(|v| v.as_str()).unwrap_or("N/A");
        let symbol = info.get("symbol").and_then(|v| v.as_str()).unwrap_or("N/A");
        Some(format!("{name} ({symbol})"))
    }

    pub fn safety_score(&self) -> Option<f64> {
        self.0
            .pointer("/risk_assessment/overall_score")
            .and_then(|v| v.as_f64())
    }

    pub fn risk_level(&self) -> Option<&str> {
        self.0
            .pointer("/risk_assessment/risk_level")
            .and_then(|v| v.as_str())
    }
}

/// JS truthiness: null, false, 0 and "" are falsy; arrays and objects are not.
pub fn is_truthy(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// The payload's `error` field, if it holds a truthy value.
pub fn error_field(payload: &serde_json::Value) -> Option<String> {
    match payload.get("error").filter(|v| is_truthy(v))? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A settled, successful scan together with client-side timing.
#[derive(Debug, Clone)]
pub struct CompletedScan {
    pub address: String,
    pub scanned_at_utc: String,
    pub elapsed_ms: u64,
    pub result: ScanResult,
}

/// Aggregate counters from the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScanStats {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_scans: u64,
    #[serde(default)]
    pub ml_enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_zero<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(de)?.unwrap_or(0))
}
