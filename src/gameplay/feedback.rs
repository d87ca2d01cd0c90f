//! Audio feedback requests with a global concurrency budget.
//!
//! Combat systems never play sounds directly; they write
//! [`PlaySoundRequest`] messages. A single sink drains them at the end of
//! the frame and drops requests once the budget of concurrently playing
//! sounds is exhausted, so a dense salvo cannot stack unbounded audio.

use bevy::prelude::*;
use rand::Rng;

use crate::{GameSet, gameplay_running};

// === Constants ===

/// Maximum sounds playing at once; requests beyond this are dropped.
const MAX_CONCURRENT_SOUNDS: usize = 10;

// === Sound Kinds ===

/// Everything combat can ask the audio layer to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SoundKind {
    ShotLight,
    ShotHeavy,
    RocketLaunch,
    BulletBreak,
    RocketBreak,
    Explosion,
    ActorHit,
    ActorDestroyed,
}

impl SoundKind {
    /// Nominal clip length, used to decide when a budget slot frees up.
    #[must_use]
    pub const fn duration_secs(self) -> f32 {
        match self {
            Self::ShotLight | Self::BulletBreak => 0.3,
            Self::ShotHeavy | Self::ActorHit => 0.5,
            Self::RocketLaunch | Self::RocketBreak => 0.8,
            Self::Explosion | Self::ActorDestroyed => 1.5,
        }
    }
}

/// Uniformly picks one of `variants`, or `None` when the list is empty.
/// Shot definitions may legitimately carry no sound.
#[must_use]
pub fn random_variant(rng: &mut impl Rng, variants: &[SoundKind]) -> Option<SoundKind> {
    if variants.is_empty() {
        return None;
    }
    Some(variants[rng.random_range(0..variants.len())])
}

// === Messages ===

/// A request to play one sound at a world position. May be dropped if too
/// many sounds are already playing.
#[derive(Message, Debug, Clone, Copy)]
pub struct PlaySoundRequest {
    pub kind: SoundKind,
    pub position: Vec2,
    pub volume: f32,
}

impl PlaySoundRequest {
    #[must_use]
    pub const fn new(kind: SoundKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            volume: 1.0,
        }
    }

    #[must_use]
    pub const fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

// === Resources ===

/// Tracks when each currently playing sound finishes. A slot is reclaimed
/// as soon as its deadline passes.
#[derive(Resource, Debug, Default)]
pub struct SoundBudget {
    playing_until: Vec<f32>,
}

impl SoundBudget {
    /// Claims a budget slot for a sound ending at `now + duration`.
    /// Returns false (request should be dropped) when the budget is full.
    pub fn try_claim(&mut self, now: f32, duration: f32) -> bool {
        self.playing_until.retain(|&deadline| deadline > now);
        if self.playing_until.len() >= MAX_CONCURRENT_SOUNDS {
            return false;
        }
        self.playing_until.push(now + duration);
        true
    }

    #[must_use]
    pub fn active(&self, now: f32) -> usize {
        self.playing_until
            .iter()
            .filter(|&&deadline| deadline > now)
            .count()
    }
}

// === Systems ===

fn play_requested_sounds(
    mut requests: MessageReader<PlaySoundRequest>,
    mut budget: ResMut<SoundBudget>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();
    for request in requests.read() {
        if !budget.try_claim(now, request.kind.duration_secs()) {
            debug!("sound budget full, dropping {:?}", request.kind);
            continue;
        }
        // Audio backend hookup lands here; the budget and request flow are
        // what combat depends on.
        debug!(
            "playing {:?} at {} (volume {})",
            request.kind, request.position, request.volume
        );
    }
}

// === Plugin ===

pub fn plugin(app: &mut App) {
    app.register_type::<SoundKind>();
    app.add_message::<PlaySoundRequest>();
    app.init_resource::<SoundBudget>();

    app.add_systems(
        Update,
        play_requested_sounds
            .in_set(GameSet::Cleanup)
            .run_if(gameplay_running),
    );
}
