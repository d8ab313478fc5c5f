//! Dispatch configuration.
//!
//! Built with bon builders; `from_env` provides the process default.

use bon::bon;

/// Which dispatch modes check output buffer identity after a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputValidation {
    /// Both stateless and stateful kernels (default).
    #[default]
    Always,

    /// Only kernels registered as named stateless implementations.
    ///
    /// Stateful callables run unchecked in this mode.
    StatelessOnly,

    /// No identity checks.
    Never,
}

impl OutputValidation {
    /// Whether kernels dispatched in `mode` are validated.
    pub fn applies_to(&self, mode: crate::DispatchMode) -> bool {
        match self {
            Self::Always => true,
            Self::StatelessOnly => mode == crate::DispatchMode::Stateless,
            Self::Never => false,
        }
    }

    /// Parse `always`, `stateless` or `never` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Some(Self::Always),
            "stateless" => Some(Self::StatelessOnly),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    /// Read `KILN_OUTPUT_VALIDATION`; unset or unknown values give the default.
    pub fn from_env() -> Self {
        std::env::var("KILN_OUTPUT_VALIDATION").ok().and_then(|value| Self::parse(&value)).unwrap_or_default()
    }
}

/// Settings a backend applies to every kernel handle it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchConfig {
    pub output_validation: OutputValidation,
}

#[bon]
impl DispatchConfig {
    /// Create a dispatch configuration with builder pattern.
    #[builder]
    pub fn builder(#[builder(default)] output_validation: OutputValidation) -> Self {
        Self { output_validation }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `KILN_OUTPUT_VALIDATION` - `always`, `stateless` or `never`
    pub fn from_env() -> Self {
        Self::builder().output_validation(OutputValidation::from_env()).build()
    }
}
