//! Scene, anchor and terminal-action types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Portraits that can be shown inside the central circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portrait {
    LifePath,
    Birthday,
    Expression,
    Soul,
    Personality,
}

/// The closed set of visual states the UI can be in.
///
/// Exactly one scene is current at any time, so combinations such as
/// "table and circle both visible" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    /// Empty cosmic circle, the resting state.
    #[default]
    NeutralCircle,
    /// Step-by-step calculation animation.
    CalculationTable,
    /// The final number shown inside the circle.
    NumberReveal,
    /// A portrait image inside the circle.
    Portrait(Portrait),
    /// Letter-to-number lookup table.
    NumerologyTable,
    /// Vowels lit up in the name.
    PhonemeHighlight,
    /// Lead-capture form; usually the hand-off target.
    LeadCapture,
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeutralCircle => f.write_str("neutral-circle"),
            Self::CalculationTable => f.write_str("calculation-table"),
            Self::NumberReveal => f.write_str("number-reveal"),
            Self::Portrait(p) => write!(f, "portrait:{p:?}"),
            Self::NumerologyTable => f.write_str("numerology-table"),
            Self::PhonemeHighlight => f.write_str("phoneme-highlight"),
            Self::LeadCapture => f.write_str("lead-capture"),
        }
    }
}

/// Extra effect applied when an anchor fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Increment the replay key so the scene's visual restarts from scratch.
    BumpReplayKey,
    /// Hold segment advancement until the UI reports the scene animation done.
    HoldForAnimation,
}

/// Declarative rule: when the chunk containing `match_text` becomes active
/// for the first time, switch to `scene` and apply `effects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(rename = "match")]
    pub match_text: String,
    pub scene: Scene,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<SideEffect>,
}

impl Anchor {
    pub fn new(match_text: impl Into<String>, scene: Scene) -> Self {
        Self {
            match_text: match_text.into(),
            scene,
            effects: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: SideEffect) -> Self {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
        self
    }

    #[must_use]
    pub fn has_effect(&self, effect: SideEffect) -> bool {
        self.effects.contains(&effect)
    }
}

/// What happens once the last caption of the last segment is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalAction {
    /// The session simply completes.
    #[default]
    End,
    /// Switch to the given scene and signal a downstream collaborator.
    Handoff(Scene),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_json_shape() {
        let json = r#"{"match":"Pourquoi votre nom ?","scene":"numerology_table"}"#;
        let anchor: Anchor = serde_json::from_str(json).unwrap();
        assert_eq!(anchor.scene, Scene::NumerologyTable);
        assert!(anchor.effects.is_empty());

        let json = r#"{"match":"Il s'agit du Chemin de Vie","scene":{"portrait":"life_path"},"effects":["bump_replay_key"]}"#;
        let anchor: Anchor = serde_json::from_str(json).unwrap();
        assert_eq!(anchor.scene, Scene::Portrait(Portrait::LifePath));
        assert!(anchor.has_effect(SideEffect::BumpReplayKey));
    }

    #[test]
    fn with_effect_is_deduplicated() {
        let anchor = Anchor::new("x", Scene::CalculationTable)
            .with_effect(SideEffect::BumpReplayKey)
            .with_effect(SideEffect::BumpReplayKey);
        assert_eq!(anchor.effects.len(), 1);
    }

    #[test]
    fn terminal_action_json() {
        let action: TerminalAction = serde_json::from_str(r#"{"handoff":"lead_capture"}"#).unwrap();
        assert_eq!(action, TerminalAction::Handoff(Scene::LeadCapture));
    }
}
