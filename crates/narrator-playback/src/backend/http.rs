//! Speech service client (Azure Cognitive Services compatible SSML endpoint).
//!
//! One POST per request, no retries: the scheduler owns retry policy.

use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{
    AudioClip, AudioFormat, SegmentPriority, Substitution, TtsError, TtsProvider, TtsRequest,
    VoiceSettings,
};

/// Environment variable holding the subscription key.
pub const KEY_ENV: &str = "NARRATOR_TTS_KEY";

/// Environment variable holding the service region.
pub const REGION_ENV: &str = "NARRATOR_TTS_REGION";

/// Requested output encoding.
pub const OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";

/// A cut is only made at punctuation past this share of the cap.
const CUT_THRESHOLD: f64 = 0.7;

/// Configuration for [`HttpTtsProvider`].
///
/// ```
/// use narrator_playback::backend::HttpTtsConfig;
///
/// let config = HttpTtsConfig::new("secret", "westeurope")
///     .with_endpoint("http://127.0.0.1:9000/tts");
/// assert_eq!(config.endpoint(), "http://127.0.0.1:9000/tts");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    key: String,
    endpoint: String,
    user_agent: String,
    high_priority_timeout: Duration,
    normal_timeout: Duration,
    high_priority_max_chars: usize,
    normal_max_chars: usize,
    substitutions: Vec<Substitution>,
}

impl HttpTtsConfig {
    /// Configuration for a key and region with default limits.
    pub fn new(key: impl Into<String>, region: &str) -> Self {
        Self {
            key: key.into(),
            endpoint: format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1"),
            user_agent: concat!("narrator/", env!("CARGO_PKG_VERSION")).to_string(),
            high_priority_timeout: Duration::from_secs(5),
            normal_timeout: Duration::from_secs(15),
            high_priority_max_chars: 200,
            normal_max_chars: 500,
            substitutions: Vec::new(),
        }
    }

    /// Read key and region from [`KEY_ENV`] and [`REGION_ENV`].
    pub fn from_env() -> Result<Self, TtsError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| TtsError::Configuration(format!("{name} is not set")))
        };
        let key = read(KEY_ENV)?;
        let region = read(REGION_ENV)?;
        Ok(Self::new(key, region.trim()))
    }

    /// Override the full endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_substitutions(mut self, substitutions: Vec<Substitution>) -> Self {
        self.substitutions = substitutions;
        self
    }

    /// Set both per-priority timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, high: Duration, normal: Duration) -> Self {
        self.high_priority_timeout = high;
        self.normal_timeout = normal;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    const fn timeout(&self, priority: SegmentPriority) -> Duration {
        match priority {
            SegmentPriority::High => self.high_priority_timeout,
            SegmentPriority::Normal => self.normal_timeout,
        }
    }

    const fn max_chars(&self, priority: SegmentPriority) -> usize {
        match priority {
            SegmentPriority::High => self.high_priority_max_chars,
            SegmentPriority::Normal => self.normal_max_chars,
        }
    }
}

/// Synthesizes speech over HTTP.
pub struct HttpTtsProvider {
    client: reqwest::Client,
    config: HttpTtsConfig,
}

impl HttpTtsProvider {
    pub fn new(config: HttpTtsConfig) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TtsError::Configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Provider configured from the environment and voice settings.
    pub fn from_env(voice: &VoiceSettings) -> Result<Self, TtsError> {
        Self::new(HttpTtsConfig::from_env()?.with_substitutions(voice.substitutions.clone()))
    }

    /// SSML document for a request, after capping and substitutions.
    #[must_use]
    pub fn build_ssml(&self, request: &TtsRequest) -> String {
        let capped = cap_text(request.text.trim(), self.config.max_chars(request.priority));
        let spoken = apply_substitutions(capped, &self.config.substitutions);
        let lang = escape_xml(&request.voice.language);
        format!(
            "<speak version='1.0' xml:lang='{lang}'><voice xml:lang='{lang}' name='{name}'>{text}</voice></speak>",
            name = escape_xml(&request.voice.name),
            text = escape_xml(&spoken),
        )
    }
}

#[async_trait]
impl TtsProvider for HttpTtsProvider {
    async fn synthesize(&self, request: TtsRequest) -> Result<AudioClip, TtsError> {
        if request.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }
        let timeout = self.config.timeout(request.priority);
        let body = self.build_ssml(&request);

        tracing::debug!(
            segment = request.segment,
            priority = ?request.priority,
            chars = request.text.chars().count(),
            "requesting speech synthesis"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(segment = request.segment, status = status.as_u16(), "speech service error");
            return Err(TtsError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| classify(&e, timeout))?;
        if bytes.is_empty() {
            return Err(TtsError::Http {
                status: status.as_u16(),
                message: "empty audio body".to_string(),
            });
        }

        tracing::debug!(segment = request.segment, bytes = bytes.len(), "speech synthesized");
        Ok(AudioClip::new(bytes.to_vec(), AudioFormat::Mp3))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn classify(error: &reqwest::Error, timeout: Duration) -> TtsError {
    if error.is_timeout() {
        TtsError::Timeout(timeout)
    } else {
        TtsError::Network(error.to_string())
    }
}

/// Trim `text` to `max_chars`, preferring to end on a period or comma when
/// one lies far enough into the cap.
fn cap_text(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    tracing::debug!(from = text.chars().count(), to = max_chars, "text capped for synthesis");

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let threshold = (max_chars as f64 * CUT_THRESHOLD) as usize;
    head.char_indices()
        .enumerate()
        .filter(|(_, (_, c))| matches!(c, '.' | ','))
        .last()
        .filter(|(char_pos, _)| *char_pos > threshold)
        .map_or(head, |(_, (byte, c))| &head[..byte + c.len_utf8()])
}

fn apply_substitutions(text: &str, substitutions: &[Substitution]) -> String {
    substitutions
        .iter()
        .filter(|s| !s.from.is_empty())
        .fold(text.to_string(), |acc, s| acc.replace(&s.from, &s.to))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
