#![forbid(unsafe_code)]

//! Layout transition animator.
//!
//! Tweens node positions from where they are to where a layout pass wants
//! them. The host calls [`TransitionAnimator::tick`] once per frame with the
//! frame delta; nothing here reads a clock.
//!
//! # Invariants
//!
//! - Only nodes named in the target map are written. Other nodes may be
//!   edited freely while a transition runs.
//! - Starting a transition cancels the one in flight. Each start bumps the
//!   generation; a [`TransitionToken`] from an older generation is stale.
//! - The final tick writes the exact targets, so float drift never
//!   survives a completed transition.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Target id not in store at start | Ignored |
//! | Node removed mid-transition | Its track is skipped |
//! | Zero duration | Snaps on the first tick |
//! | Empty target map | No transition; `start` returns the token anyway |

use std::collections::HashMap;
use std::time::Duration;

use arbor_core::animation::{Animation, EasingFn, Tween, ease_in_out_cubic};
use arbor_core::{GraphStore, NodeId, Point};

/// Identifies one started transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionToken(u64);

impl TransitionToken {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnimationStatus {
    /// No transition in flight.
    #[default]
    Idle,
    /// Positions were interpolated; `progress` is the eased value.
    Running { token: TransitionToken, progress: f64 },
    /// The transition completed on this tick and targets were written.
    Finished { token: TransitionToken },
}

#[derive(Debug, Clone)]
struct Track {
    id: NodeId,
    start: Point,
    target: Point,
}

#[derive(Debug, Clone)]
struct Transition {
    token: TransitionToken,
    tween: Tween,
    tracks: Vec<Track>,
}

/// Position tweening over the graph store.
#[derive(Debug, Clone)]
pub struct TransitionAnimator {
    generation: u64,
    duration: Duration,
    easing: EasingFn,
    active: Option<Transition>,
}

impl Default for TransitionAnimator {
    fn default() -> Self {
        Self::new(Duration::from_millis(800))
    }
}

impl TransitionAnimator {
    /// An animator using ease-in-out cubic over `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            generation: 0,
            duration,
            easing: ease_in_out_cubic,
            active: None,
        }
    }

    /// Set the easing curve for subsequent transitions.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Begin tweening toward `targets`, cancelling any transition in
    /// flight. Start positions are read from `store` now.
    pub fn start(
        &mut self,
        store: &GraphStore,
        targets: impl IntoIterator<Item = (NodeId, Point)>,
    ) -> TransitionToken {
        if let Some(previous) = self.stop() {
            tracing::debug!(
                generation = previous.generation(),
                "cancelled in-flight transition"
            );
        }
        self.generation = self.generation.wrapping_add(1);
        let token = TransitionToken(self.generation);

        let tracks: Vec<Track> = targets
            .into_iter()
            .filter_map(|(id, target)| {
                let start = store.node(&id)?.position;
                Some(Track { id, start, target })
            })
            .collect();

        if tracks.is_empty() {
            return token;
        }
        tracing::debug!(
            generation = token.generation(),
            nodes = tracks.len(),
            duration_ms = self.duration.as_millis() as u64,
            "transition started"
        );
        self.active = Some(Transition {
            token,
            tween: Tween::new(self.duration).easing(self.easing),
            tracks,
        });
        token
    }

    /// Cancel the transition in flight, leaving nodes where they are.
    pub fn stop(&mut self) -> Option<TransitionToken> {
        self.active.take().map(|t| t.token)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `token` names the transition currently in flight.
    #[must_use]
    pub fn is_current(&self, token: TransitionToken) -> bool {
        self.active.as_ref().is_some_and(|t| t.token == token)
    }

    /// Ids being moved by the transition in flight.
    pub fn animated_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.active
            .iter()
            .flat_map(|t| t.tracks.iter().map(|track| &track.id))
    }

    /// Target of every node the transition in flight is moving.
    pub fn targets(&self) -> impl Iterator<Item = (&NodeId, Point)> + '_ {
        self.active
            .iter()
            .flat_map(|t| t.tracks.iter().map(|track| (&track.id, track.target)))
    }

    /// Advance by `dt` and write interpolated positions into `store`.
    pub fn tick(&mut self, dt: Duration, store: &mut GraphStore) -> AnimationStatus {
        let Some(transition) = self.active.as_mut() else {
            return AnimationStatus::Idle;
        };
        transition.tween.tick(dt);
        let done = transition.tween.is_complete();
        let progress = transition.tween.value();

        let frame: HashMap<&NodeId, Point> = transition
            .tracks
            .iter()
            .map(|track| {
                let position = if done {
                    track.target
                } else {
                    track.start.lerp(track.target, progress)
                };
                (&track.id, position)
            })
            .collect();
        store.set_nodes(|nodes| {
            for node in nodes.iter_mut() {
                if let Some(&position) = frame.get(&node.id) {
                    node.position = position;
                }
            }
        });

        let token = transition.token;
        if done {
            self.active = None;
            tracing::debug!(generation = token.generation(), "transition finished");
            AnimationStatus::Finished { token }
        } else {
            AnimationStatus::Running { token, progress }
        }
    }
}
