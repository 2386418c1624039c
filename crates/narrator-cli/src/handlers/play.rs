//! Play command handler.
//!
//! Runs a full narration session and prints its events as they arrive.
//! There is no UI to animate scenes, so held scenes are acknowledged as soon
//! as they are printed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use narrator_core::{
    Anchor, NarrationEvent, NarrationSettings, NoopAmbient, Scene, SessionSummary,
    TerminalAction, TimingEstimator, TtsProvider,
};
use narrator_playback::{
    AudioOutput, HttpTtsProvider, NarrationSession, SimulatedOutput, ToneProvider,
};

use crate::error::CliError;
use crate::handlers::read_script;
use crate::presentation::event_line;

/// Flags of the play command.
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub anchors: Option<PathBuf>,
    pub offline: bool,
    pub speaker: bool,
    pub json: bool,
    pub handoff: bool,
}

/// Execute the play command.
///
/// Ctrl-C stops the session cleanly; the summary is still printed.
pub async fn execute(
    settings: NarrationSettings,
    script: &Path,
    options: &PlayOptions,
) -> Result<SessionSummary> {
    let script = read_script(script)?;
    let anchors = match &options.anchors {
        Some(path) => load_anchors(path)?,
        None => Vec::new(),
    };
    let terminal = if options.handoff {
        TerminalAction::Handoff(Scene::LeadCapture)
    } else {
        TerminalAction::End
    };

    let provider = build_provider(&settings, options.offline)?;
    let output = open_output(options.speaker)?;

    let (handle, mut events) = NarrationSession::new(script)
        .with_anchors(anchors)
        .with_terminal(terminal)
        .with_settings(settings)
        .start(provider, output, Arc::new(NoopAmbient))
        .map_err(CliError::from)?;

    let mut interrupted = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if matches!(event, NarrationEvent::SceneChanged { hold: true, .. }) {
                    handle.animation_complete();
                }
                if options.json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!("{}", event_line(&event));
                }
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal?;
                interrupted = true;
                tracing::info!("interrupted, stopping narration");
                handle.stop();
            }
        }
    }

    let summary = handle.wait().await.map_err(CliError::from)?;
    if !options.json {
        println!(
            "\nPlayed {} segment(s), skipped {} ({} attempt(s)).",
            summary.played, summary.skipped, summary.attempts
        );
        if summary.degraded {
            println!("Audio was unavailable; captions advanced on a timer.");
        }
    }
    Ok(summary)
}

/// Parse an anchors file: a JSON array of `{"match", "scene", "effects"}`.
pub fn load_anchors(path: &Path) -> Result<Vec<Anchor>, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::Config(format!("invalid anchors file {}: {e}", path.display())))
}

fn build_provider(
    settings: &NarrationSettings,
    offline: bool,
) -> Result<Arc<dyn TtsProvider>, CliError> {
    if offline {
        let estimator = TimingEstimator::new(settings.timing.words_per_minute);
        return Ok(Arc::new(ToneProvider::new(estimator)));
    }
    Ok(Arc::new(HttpTtsProvider::from_env(&settings.voice)?))
}

fn open_output(speaker: bool) -> Result<Arc<dyn AudioOutput>, CliError> {
    if speaker {
        #[cfg(feature = "speaker")]
        {
            let output = narrator_playback::SpeakerOutput::open()
                .map_err(|e| CliError::Audio(e.to_string()))?;
            return Ok(Arc::new(output));
        }
        #[cfg(not(feature = "speaker"))]
        return Err(CliError::Arguments(
            "--speaker needs narrator built with the `speaker` feature".to_string(),
        ));
    }
    Ok(Arc::new(SimulatedOutput::new()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use narrator_core::SideEffect;

    use super::*;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_load_anchors() {
        let file = write_temp(
            r#"[
                {"match": "Chemin de Vie", "scene": "calculation_table"},
                {"match": "vos coordonnées", "scene": "lead_capture", "effects": ["hold_for_animation"]}
            ]"#,
        );
        let anchors = load_anchors(file.path()).unwrap();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].scene, Scene::CalculationTable);
        assert!(anchors[1].has_effect(SideEffect::HoldForAnimation));
    }

    #[test]
    fn test_malformed_anchors_are_config_errors() {
        let file = write_temp(r#"{"match": "not an array"}"#);
        let err = load_anchors(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[cfg(not(feature = "speaker"))]
    #[test]
    fn test_speaker_requires_feature() {
        assert!(matches!(open_output(true), Err(CliError::Arguments(_))));
        assert!(open_output(false).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_session_runs_to_completion() {
        let script = write_temp("Bonjour. Votre Chemin de Vie est le 7.");
        let anchors = write_temp(r#"[{"match": "Chemin de Vie", "scene": "calculation_table"}]"#);
        let options = PlayOptions {
            anchors: Some(anchors.path().to_path_buf()),
            offline: true,
            handoff: true,
            ..PlayOptions::default()
        };

        let summary = execute(NarrationSettings::default(), script.path(), &options)
            .await
            .unwrap();
        assert_eq!(summary.played, 1);
        assert_eq!(summary.anchors_fired, 1);
        assert!(summary.handed_off);
    }
}
