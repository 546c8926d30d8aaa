//! Player controller: input to velocity, jump gating, and the two timed statuses (jump boost and
//! invincibility). The `Player` component owns its timers outright, so a despawned player can
//! never have a stale expiry fire against it.
//!
//! Movement integration and ground detection are the physics module's job; the controller only
//! reads `Contacts` from the previous step and writes `Velocity`.

use std::time::Duration;

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::config::GameConfig;
use crate::physics::{Collider, Contacts, Gravity, Velocity};
use crate::pickup::PowerupEffect;
use crate::scene::{SceneId, SceneMember};
use crate::sprites::{feet_anchor, SpriteAnimator, SpriteSheets, PLAYER_FRAME, SPRITE_SCALE};
use crate::state::{GameSet, GameState};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInput>().add_systems(
            Update,
            (
                read_player_input.in_set(GameSet::Input),
                (tick_player_status, drive_player)
                    .chain()
                    .in_set(GameSet::Movement),
                animate_player.in_set(GameSet::Effects),
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// Horizontal speed below which a grounded player counts as standing still.
const MOVING_EPSILON: f32 = 5.0;
/// Half-period of the invincibility blink.
const BLINK_HALF_PERIOD_MS: u128 = 60;
const BLINK_MIN_ALPHA: f32 = 0.35;

/// One frame of player intent. `jump` is the held state; the controller derives the edge.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Visual state, always derived from velocity and ground contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAnim {
    Idle,
    Walk,
    Jump,
}

impl PlayerAnim {
    pub fn derive(velocity: Vec2, grounded: bool) -> Self {
        if !grounded {
            PlayerAnim::Jump
        } else if velocity.x.abs() > MOVING_EPSILON {
            PlayerAnim::Walk
        } else {
            PlayerAnim::Idle
        }
    }

    pub fn frames(self) -> &'static [usize] {
        match self {
            PlayerAnim::Idle => &[0],
            PlayerAnim::Walk => &[1, 2],
            PlayerAnim::Jump => &[3],
        }
    }

    pub fn fps(self) -> f32 {
        match self {
            PlayerAnim::Walk => 8.0,
            PlayerAnim::Idle | PlayerAnim::Jump => 1.0,
        }
    }
}

/// Which timed statuses ran out during a `tick`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusExpiry {
    pub boost_expired: bool,
    pub invincibility_ended: bool,
}

#[derive(Component, Debug)]
pub struct Player {
    pub speed: f32,
    /// Upward impulse before any boost is applied.
    pub base_jump_velocity: f32,
    pub facing: Facing,
    jump_boost: f32,
    /// Single pending reset of `jump_boost` back to 1. Replaced, never duplicated.
    boost_expiry: Option<Timer>,
    invincibility: Option<Timer>,
    jump_held: bool,
}

impl Player {
    pub fn new(speed: f32, base_jump_velocity: f32) -> Self {
        Self {
            speed,
            base_jump_velocity,
            facing: Facing::Right,
            jump_boost: 1.0,
            boost_expiry: None,
            invincibility: None,
            jump_held: false,
        }
    }

    pub fn jump_boost(&self) -> f32 {
        self.jump_boost
    }

    pub fn invincible(&self) -> bool {
        self.invincibility.is_some()
    }

    #[cfg(test)]
    fn has_pending_boost_expiry(&self) -> bool {
        self.boost_expiry.is_some()
    }

    /// Applies one frame of input. Returns `true` when a jump impulse fired.
    ///
    /// Left wins over right when both are held. A jump needs ground contact and a fresh press:
    /// holding the button through a landing does not jump again.
    pub fn drive(&mut self, input: Option<&PlayerInput>, grounded: bool, velocity: &mut Vec2) -> bool {
        let Some(input) = input else {
            return false;
        };

        if input.left {
            velocity.x = -self.speed;
            self.facing = Facing::Left;
        } else if input.right {
            velocity.x = self.speed;
            self.facing = Facing::Right;
        } else {
            velocity.x = 0.0;
        }

        let pressed = input.jump && !self.jump_held;
        self.jump_held = input.jump;

        if pressed && grounded {
            velocity.y = self.base_jump_velocity * self.jump_boost;
            return true;
        }
        false
    }

    /// Sets the multiplier immediately and (re)arms its reset. A second grant before expiry
    /// replaces both the multiplier and the timer.
    pub fn grant_jump_boost(&mut self, multiplier: f32, duration: Duration) {
        self.jump_boost = multiplier;
        self.boost_expiry = Some(Timer::new(duration, TimerMode::Once));
    }

    /// Starts an invincibility window unless one is already running. Returns whether it started.
    pub fn grant_invincibility(&mut self, duration: Duration) -> bool {
        if self.invincible() {
            return false;
        }
        self.invincibility = Some(Timer::new(duration, TimerMode::Once));
        true
    }

    /// Dispatches a pickup effect. Returns the score it awards, if any.
    pub fn apply_effect(&mut self, effect: PowerupEffect) -> u32 {
        match effect {
            PowerupEffect::ScoreBonus(points) => points,
            PowerupEffect::JumpBoost {
                multiplier,
                duration,
            } => {
                self.grant_jump_boost(multiplier, duration);
                0
            }
            PowerupEffect::Invincibility { duration } => {
                self.grant_invincibility(duration);
                0
            }
        }
    }

    pub fn tick(&mut self, delta: Duration) -> StatusExpiry {
        let mut expiry = StatusExpiry::default();

        if let Some(timer) = self.boost_expiry.as_mut() {
            if timer.tick(delta).finished() {
                self.jump_boost = 1.0;
                self.boost_expiry = None;
                expiry.boost_expired = true;
            }
        }

        if let Some(timer) = self.invincibility.as_mut() {
            if timer.tick(delta).finished() {
                self.invincibility = None;
                expiry.invincibility_ended = true;
            }
        }

        expiry
    }

    /// Sprite alpha for the current frame: a 120 ms triangle wave while invincible, opaque
    /// otherwise.
    pub fn blink_alpha(&self) -> f32 {
        let Some(timer) = &self.invincibility else {
            return 1.0;
        };
        let phase = timer.elapsed().as_millis() % (BLINK_HALF_PERIOD_MS * 2);
        let t = phase as f32 / BLINK_HALF_PERIOD_MS as f32;
        let depth = 1.0 - BLINK_MIN_ALPHA;
        if t < 1.0 {
            1.0 - depth * t
        } else {
            BLINK_MIN_ALPHA + depth * (t - 1.0)
        }
    }
}

/// Spawns the player standing with its feet at `feet`.
pub fn spawn_player(
    commands: &mut Commands,
    scene: SceneId,
    feet: Vec2,
    config: &GameConfig,
    sheets: &SpriteSheets,
) -> Entity {
    let body = config.player.body_size;
    let sprite_size = PLAYER_FRAME.as_vec2() * SPRITE_SCALE;
    let center = feet + Vec2::new(0.0, body.y * 0.5);

    commands
        .spawn((
            Name::new("Player"),
            SceneMember(scene),
            Player::new(config.player.speed, config.player.jump_velocity),
            SpriteBundle {
                texture: sheets.player.clone(),
                sprite: Sprite {
                    custom_size: Some(sprite_size),
                    anchor: feet_anchor(body.y, sprite_size.y),
                    ..default()
                },
                transform: Transform::from_translation(center.extend(10.0)),
                ..default()
            },
            TextureAtlas {
                layout: sheets.player_layout.clone(),
                index: 0,
            },
            SpriteAnimator::new(PlayerAnim::Idle.frames(), PlayerAnim::Idle.fps()),
            Velocity::default(),
            Gravity(config.player.gravity),
            Contacts::default(),
            Collider::from_size(body),
        ))
        .id()
}

fn read_player_input(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    *input = PlayerInput {
        left: keyboard.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]),
        right: keyboard.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]),
        jump: keyboard.any_pressed([KeyCode::ArrowUp, KeyCode::Space, KeyCode::KeyW]),
    };
}

fn tick_player_status(time: Res<Time>, mut players: Query<&mut Player>) {
    for mut player in &mut players {
        let expiry = player.tick(time.delta());
        if expiry.boost_expired {
            debug!("Jump boost expired");
        }
        if expiry.invincibility_ended {
            debug!("Invincibility ended");
        }
    }
}

fn drive_player(
    input: Option<Res<PlayerInput>>,
    mut players: Query<(&mut Player, &mut Velocity, &Contacts)>,
    mut cues: EventWriter<AudioCue>,
) {
    for (mut player, mut velocity, contacts) in &mut players {
        if player.drive(input.as_deref(), contacts.grounded(), &mut velocity.0) {
            cues.send(AudioCue::Jump);
        }
    }
}

fn animate_player(
    time: Res<Time>,
    mut players: Query<(
        &Player,
        &Velocity,
        &Contacts,
        &mut Sprite,
        &mut TextureAtlas,
        &mut SpriteAnimator,
    )>,
) {
    for (player, velocity, contacts, mut sprite, mut atlas, mut animator) in &mut players {
        let anim = PlayerAnim::derive(velocity.0, contacts.grounded());
        animator.set_clip(anim.frames(), anim.fps());
        atlas.index = animator.tick(time.delta());

        sprite.flip_x = player.facing == Facing::Left;
        sprite.color.set_alpha(player.blink_alpha());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUMP: PlayerInput = PlayerInput {
        left: false,
        right: false,
        jump: true,
    };
    const IDLE: PlayerInput = PlayerInput {
        left: false,
        right: false,
        jump: false,
    };

    fn player() -> Player {
        Player::new(180.0, 360.0)
    }

    #[test]
    fn jump_from_rest_then_airborne_press_is_ignored() {
        let mut p = player();
        let mut velocity = Vec2::ZERO;

        assert!(p.drive(Some(&JUMP), true, &mut velocity));
        assert_eq!(velocity.y, 360.0);

        // Released and pressed again mid-air.
        velocity.y = 120.0;
        assert!(!p.drive(Some(&IDLE), false, &mut velocity));
        assert!(!p.drive(Some(&JUMP), false, &mut velocity));
        assert_eq!(velocity.y, 120.0);

        // Back on the ground, a fresh press jumps again.
        assert!(!p.drive(Some(&IDLE), true, &mut velocity));
        assert!(p.drive(Some(&JUMP), true, &mut velocity));
        assert_eq!(velocity.y, 360.0);
    }

    #[test]
    fn holding_jump_fires_once_per_rising_edge() {
        let mut p = player();
        let mut velocity = Vec2::ZERO;
        let held = [true, true, true, false, true, true, false, false, true];
        let mut fired = Vec::new();

        for jump in held {
            let input = PlayerInput { jump, ..IDLE };
            // Grounded every frame: only edges may fire.
            fired.push(p.drive(Some(&input), true, &mut velocity));
        }

        let rising_edges: Vec<bool> = held
            .iter()
            .enumerate()
            .map(|(i, &now)| now && (i == 0 || !held[i - 1]))
            .collect();
        assert_eq!(fired, rising_edges);
    }

    #[test]
    fn left_wins_over_right_and_sets_facing() {
        let mut p = player();
        let mut velocity = Vec2::ZERO;
        let both = PlayerInput {
            left: true,
            right: true,
            jump: false,
        };

        p.drive(Some(&both), true, &mut velocity);
        assert_eq!(velocity.x, -180.0);
        assert_eq!(p.facing, Facing::Left);

        p.drive(Some(&PlayerInput { right: true, ..IDLE }), true, &mut velocity);
        assert_eq!(velocity.x, 180.0);
        assert_eq!(p.facing, Facing::Right);

        p.drive(Some(&IDLE), true, &mut velocity);
        assert_eq!(velocity.x, 0.0);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn missing_input_is_a_no_op() {
        let mut p = player();
        let mut velocity = Vec2::new(42.0, -7.0);
        assert!(!p.drive(None, true, &mut velocity));
        assert_eq!(velocity, Vec2::new(42.0, -7.0));
    }

    #[test]
    fn boosted_jump_scales_impulse() {
        let mut p = player();
        let mut velocity = Vec2::ZERO;
        p.grant_jump_boost(1.5, Duration::from_millis(1000));
        p.drive(Some(&JUMP), true, &mut velocity);
        assert_eq!(velocity.y, 540.0);
    }

    #[test]
    fn boost_reverts_after_its_duration() {
        let mut p = player();
        p.grant_jump_boost(1.35, Duration::from_millis(500));

        let expiry = p.tick(Duration::from_millis(499));
        assert!(!expiry.boost_expired);
        assert_eq!(p.jump_boost(), 1.35);

        let expiry = p.tick(Duration::from_millis(1));
        assert!(expiry.boost_expired);
        assert_eq!(p.jump_boost(), 1.0);
        assert!(!p.has_pending_boost_expiry());
    }

    #[test]
    fn regrant_replaces_pending_expiry() {
        let mut p = player();
        p.grant_jump_boost(1.2, Duration::from_millis(1000));
        p.tick(Duration::from_millis(800));

        // The first grant would have expired at 1000ms; the second restarts the clock.
        p.grant_jump_boost(1.5, Duration::from_millis(1000));
        assert!(p.has_pending_boost_expiry());
        p.tick(Duration::from_millis(300));
        assert_eq!(p.jump_boost(), 1.5);

        p.tick(Duration::from_millis(700));
        assert_eq!(p.jump_boost(), 1.0);
        assert!(!p.has_pending_boost_expiry());
    }

    #[test]
    fn any_grant_sequence_ends_at_default_multiplier() {
        let mut p = player();
        let grants = [(1.2, 300), (1.8, 50), (1.35, 700), (2.0, 10)];
        for (multiplier, ms) in grants {
            p.grant_jump_boost(multiplier, Duration::from_millis(ms));
            p.tick(Duration::from_millis(20));
        }
        // The last grant was 10ms, already past.
        assert_eq!(p.jump_boost(), 1.0);
        assert!(!p.has_pending_boost_expiry());
    }

    #[test]
    fn invincibility_does_not_stack() {
        let mut p = player();
        assert!(p.grant_invincibility(Duration::from_millis(1000)));
        p.tick(Duration::from_millis(600));
        assert!(!p.grant_invincibility(Duration::from_millis(4000)));

        let expiry = p.tick(Duration::from_millis(400));
        assert!(expiry.invincibility_ended);
        assert!(!p.invincible());
        assert_eq!(p.blink_alpha(), 1.0);
    }

    #[test]
    fn blink_dips_while_invincible() {
        let mut p = player();
        p.grant_invincibility(Duration::from_millis(1000));
        p.tick(Duration::from_millis(60));
        assert!((p.blink_alpha() - BLINK_MIN_ALPHA).abs() < 1e-4);
        p.tick(Duration::from_millis(60));
        assert!((p.blink_alpha() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn effects_dispatch_to_the_right_status() {
        let mut p = player();
        assert_eq!(p.apply_effect(PowerupEffect::ScoreBonus(100)), 100);
        assert_eq!(p.jump_boost(), 1.0);

        p.apply_effect(PowerupEffect::JumpBoost {
            multiplier: 1.2,
            duration: Duration::from_millis(1000),
        });
        assert_eq!(p.jump_boost(), 1.2);

        p.apply_effect(PowerupEffect::Invincibility {
            duration: Duration::from_millis(4000),
        });
        assert!(p.invincible());
    }

    #[test]
    fn animation_is_derived_from_motion() {
        assert_eq!(PlayerAnim::derive(Vec2::new(0.0, 200.0), false), PlayerAnim::Jump);
        assert_eq!(PlayerAnim::derive(Vec2::new(180.0, 0.0), false), PlayerAnim::Jump);
        assert_eq!(PlayerAnim::derive(Vec2::new(180.0, 0.0), true), PlayerAnim::Walk);
        assert_eq!(PlayerAnim::derive(Vec2::new(3.0, 0.0), true), PlayerAnim::Idle);
    }
}
