//! Scene direction driven by caption changes.
//!
//! Anchors are bound to global chunk indices once, when the director is
//! built. After that every decision is a lookup: the director never searches
//! text while narration runs.

use std::collections::HashSet;

use crate::domain::{Anchor, Scene, Script, SideEffect, TerminalAction};
use crate::error::NarrationError;
use crate::plan::NarrationPlan;

/// An anchor resolved to the chunk that triggers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundAnchor {
    pub anchor: Anchor,
    pub chunk: usize,
}

/// What the session should do after a director update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorAction {
    /// Show a new scene.
    ChangeScene {
        scene: Scene,
        replay_key: u64,
        hold: bool,
    },
    /// Signal the downstream collaborator that narration is over.
    Handoff { scene: Scene },
    /// Narration is over, nothing to hand off.
    End,
}

/// Finite-state machine that maps active captions to scenes.
#[derive(Debug)]
pub struct SceneDirector {
    anchors: Vec<BoundAnchor>,
    fired: HashSet<usize>,
    scene: Scene,
    replay_key: u64,
    holding: bool,
    terminal: TerminalAction,
    last_chunk: Option<usize>,
    terminal_fired: bool,
}

impl SceneDirector {
    /// Bind `anchors` against the plan.
    ///
    /// Anchors whose text is not in the script are dropped and reported as
    /// [`NarrationError::AnchorNotFound`]; this is never fatal.
    pub fn new(
        script: &Script,
        plan: &NarrationPlan,
        anchors: Vec<Anchor>,
        terminal: TerminalAction,
    ) -> (Self, Vec<NarrationError>) {
        let mut diagnostics = Vec::new();
        let mut bound = Vec::with_capacity(anchors.len());

        for anchor in anchors {
            match plan.locate(script, &anchor.match_text) {
                Some(chunk) => {
                    tracing::debug!(anchor = %anchor.match_text, chunk, scene = %anchor.scene, "anchor bound");
                    bound.push(BoundAnchor { anchor, chunk });
                }
                None => {
                    tracing::warn!(anchor = %anchor.match_text, "anchor text not found in script");
                    diagnostics.push(NarrationError::AnchorNotFound {
                        anchor: anchor.match_text,
                    });
                }
            }
        }

        let director = Self {
            anchors: bound,
            fired: HashSet::new(),
            scene: Scene::default(),
            replay_key: 0,
            holding: false,
            terminal,
            last_chunk: plan.last_chunk(),
            terminal_fired: false,
        };
        (director, diagnostics)
    }

    /// Current scene.
    #[must_use]
    pub const fn scene(&self) -> Scene {
        self.scene
    }

    /// Monotonic key; bumping it makes the UI replay the scene's visual.
    #[must_use]
    pub const fn replay_key(&self) -> u64 {
        self.replay_key
    }

    /// Whether segment advancement waits on the UI.
    #[must_use]
    pub const fn is_holding(&self) -> bool {
        self.holding
    }

    /// Number of anchors that have fired.
    #[must_use]
    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    #[must_use]
    pub fn bound_anchors(&self) -> &[BoundAnchor] {
        &self.anchors
    }

    /// React to a new active caption.
    ///
    /// Each anchor fires at most once; re-activating a chunk is a no-op.
    pub fn on_caption_changed(&mut self, global_chunk: usize) -> Vec<DirectorAction> {
        let mut actions = Vec::new();

        for (i, bound) in self.anchors.iter().enumerate() {
            if bound.chunk != global_chunk || !self.fired.insert(i) {
                continue;
            }

            let anchor = &bound.anchor;
            if anchor.has_effect(SideEffect::BumpReplayKey) {
                self.replay_key += 1;
            }
            let hold = anchor.has_effect(SideEffect::HoldForAnimation);
            self.holding |= hold;
            self.scene = anchor.scene;

            tracing::info!(
                anchor = %anchor.match_text,
                scene = %anchor.scene,
                replay_key = self.replay_key,
                hold,
                "anchor fired"
            );
            actions.push(DirectorAction::ChangeScene {
                scene: self.scene,
                replay_key: self.replay_key,
                hold,
            });
        }

        if Some(global_chunk) == self.last_chunk {
            actions.extend(self.fire_terminal());
        }
        actions
    }

    /// Narration finished; fire the terminal action if the last chunk never
    /// became active (for example because its segment was skipped).
    pub fn on_completed(&mut self) -> Vec<DirectorAction> {
        self.fire_terminal()
    }

    /// The UI finished the held animation. Returns whether a hold was active.
    pub fn animation_complete(&mut self) -> bool {
        std::mem::replace(&mut self.holding, false)
    }

    fn fire_terminal(&mut self) -> Vec<DirectorAction> {
        if std::mem::replace(&mut self.terminal_fired, true) {
            return Vec::new();
        }
        match self.terminal {
            TerminalAction::End => vec![DirectorAction::End],
            TerminalAction::Handoff(scene) => {
                tracing::info!(scene = %scene, "narration hand-off");
                let mut actions = Vec::with_capacity(2);
                if self.scene != scene {
                    self.scene = scene;
                    actions.push(DirectorAction::ChangeScene {
                        scene,
                        replay_key: self.replay_key,
                        hold: false,
                    });
                }
                actions.push(DirectorAction::Handoff { scene });
                actions
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Portrait;
    use crate::settings::SegmenterSettings;

    const SCRIPT: &str = "Bienvenue. Voici votre calcul.\n\nIl s'agit du Chemin de Vie. Merci de votre écoute.";

    fn setup(anchors: Vec<Anchor>, terminal: TerminalAction) -> (SceneDirector, Vec<NarrationError>) {
        let script = Script::new(SCRIPT);
        let settings = SegmenterSettings {
            speech_max_chars: 400,
            display_max_chars: 30,
            protected_phrases: Vec::new(),
        };
        let plan = NarrationPlan::build(&script, &settings);
        SceneDirector::new(&script, &plan, anchors, terminal)
    }

    #[test]
    fn repeated_caption_fires_once() {
        let (mut director, diagnostics) = setup(
            vec![
                Anchor::new("Voici votre calcul", Scene::CalculationTable),
                Anchor::new("Chemin de Vie", Scene::Portrait(Portrait::LifePath)),
            ],
            TerminalAction::End,
        );
        assert!(diagnostics.is_empty());
        let a = director.bound_anchors()[0].chunk;
        let b = director.bound_anchors()[1].chunk;
        assert_ne!(a, b);

        let fired: Vec<_> = [a, a, b]
            .into_iter()
            .flat_map(|chunk| director.on_caption_changed(chunk))
            .filter(|action| matches!(action, DirectorAction::ChangeScene { .. }))
            .collect();

        assert_eq!(fired.len(), 2);
        assert_eq!(director.fired_count(), 2);
        assert_eq!(director.scene(), Scene::Portrait(Portrait::LifePath));
        // Going back to A later still does nothing.
        assert!(director.on_caption_changed(a).is_empty());
    }

    #[test]
    fn missing_anchor_is_reported_not_fatal() {
        let (director, diagnostics) = setup(
            vec![
                Anchor::new("introuvable", Scene::NumberReveal),
                Anchor::new("Bienvenue", Scene::NeutralCircle),
            ],
            TerminalAction::End,
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0],
            NarrationError::AnchorNotFound { anchor } if anchor == "introuvable"
        ));
        assert_eq!(director.bound_anchors().len(), 1);
    }

    #[test]
    fn side_effects_bump_key_and_hold() {
        let (mut director, _) = setup(
            vec![Anchor::new("Voici votre calcul", Scene::CalculationTable)
                .with_effect(SideEffect::BumpReplayKey)
                .with_effect(SideEffect::HoldForAnimation)],
            TerminalAction::End,
        );
        let chunk = director.bound_anchors()[0].chunk;
        let actions = director.on_caption_changed(chunk);
        assert_eq!(
            actions,
            vec![DirectorAction::ChangeScene {
                scene: Scene::CalculationTable,
                replay_key: 1,
                hold: true
            }]
        );
        assert!(director.is_holding());
        assert!(director.animation_complete());
        assert!(!director.is_holding());
        assert!(!director.animation_complete());
    }

    #[test]
    fn last_chunk_hands_off_exactly_once() {
        let (mut director, _) = setup(Vec::new(), TerminalAction::Handoff(Scene::LeadCapture));
        let last = director.last_chunk.unwrap();
        let actions = director.on_caption_changed(last);
        assert_eq!(
            actions.last(),
            Some(&DirectorAction::Handoff {
                scene: Scene::LeadCapture
            })
        );
        assert_eq!(director.scene(), Scene::LeadCapture);
        assert!(director.on_caption_changed(last).is_empty());
        assert!(director.on_completed().is_empty());
    }

    #[test]
    fn completion_fires_terminal_when_last_chunk_skipped() {
        let (mut director, _) = setup(Vec::new(), TerminalAction::End);
        assert_eq!(director.on_completed(), vec![DirectorAction::End]);
        assert!(director.on_completed().is_empty());
    }
}
