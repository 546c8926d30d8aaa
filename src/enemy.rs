//! Patrolling Selenite enemies: bounded back-and-forth walking, wall flips, and stomp deaths.
//!
//! What a side collision does to the player is a level rule (see `level::resolve_side_hits`).
//! The enemy only answers whether it can still hurt anyone.

use std::time::Duration;

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::config::{EnemyConfig, GameConfig};
use crate::fx::Vanish;
use crate::physics::{Aabb, Collider, Contacts, Gravity, Velocity};
use crate::player::Player;
use crate::scene::{SceneId, SceneMember};
use crate::sprites::{feet_anchor, SpriteAnimator, SpriteSheets, ENEMY_FRAME, SPRITE_SCALE};
use crate::state::{GameSet, GameState};

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                patrol_enemies.in_set(GameSet::Movement),
                resolve_stomps.in_set(GameSet::Interactions),
                animate_enemies.in_set(GameSet::Effects),
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}

const WALK_FRAMES: &[usize] = &[0, 1];
const WALK_FPS: f32 = 6.0;

/// Horizontal interval an enemy paces within, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrolRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Component, Debug)]
pub struct Enemy {
    pub patrol: PatrolRange,
    pub speed: f32,
    pub stomp_threshold: f32,
    pub stomp_tolerance: f32,
    direction: f32,
    dead: bool,
}

impl Enemy {
    /// Starts walking right.
    pub fn new(patrol: PatrolRange, speed: f32, config: &EnemyConfig) -> Self {
        Self {
            patrol,
            speed,
            stomp_threshold: config.stomp_threshold,
            stomp_tolerance: config.stomp_tolerance,
            direction: 1.0,
            dead: false,
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn dead(&self) -> bool {
        self.dead
    }

    /// Picks this frame's direction and returns the horizontal velocity to walk at, or `None`
    /// once dead. Range ends only turn an enemy that is heading outwards; a wall contact turns
    /// it regardless of where it stands.
    pub fn patrol_update(&mut self, x: f32, contacts: Contacts) -> Option<f32> {
        if self.dead {
            return None;
        }

        if x <= self.patrol.min && self.direction < 0.0 {
            self.direction = 1.0;
        } else if x >= self.patrol.max && self.direction > 0.0 {
            self.direction = -1.0;
        }

        if contacts.left {
            self.direction = 1.0;
        } else if contacts.right {
            self.direction = -1.0;
        }

        Some(self.direction * self.speed)
    }

    /// A stomp needs all three: the player falling fast enough, their feet at or above this
    /// enemy's head (within tolerance) before the last `dt` of falling, and the boxes
    /// overlapping.
    pub fn is_stomp(&self, player: &Aabb, player_velocity: Vec2, dt: f32, enemy: &Aabb) -> bool {
        if self.dead {
            return false;
        }
        let fall_speed = -player_velocity.y;
        let falling = fall_speed > self.stomp_threshold;
        let feet_before = player.bottom() + fall_speed.max(0.0) * dt;
        let above = feet_before >= enemy.top() - self.stomp_tolerance;
        falling && above && player.intersects(enemy)
    }

    /// Returns `true` only for the call that actually killed it.
    pub fn kill_by_stomp(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        true
    }

    pub fn hits_player(&self) -> bool {
        !self.dead
    }
}

pub fn spawn_enemy(
    commands: &mut Commands,
    scene: SceneId,
    feet: Vec2,
    patrol: PatrolRange,
    speed: f32,
    config: &GameConfig,
    sheets: &SpriteSheets,
) -> Entity {
    let body = config.enemy.body_size;
    let sprite_size = ENEMY_FRAME.as_vec2() * SPRITE_SCALE;
    let center = feet + Vec2::new(0.0, body.y * 0.5);

    commands
        .spawn((
            Name::new("Selenite"),
            SceneMember(scene),
            Enemy::new(patrol, speed, &config.enemy),
            SpriteBundle {
                texture: sheets.enemy.clone(),
                sprite: Sprite {
                    custom_size: Some(sprite_size),
                    anchor: feet_anchor(body.y, sprite_size.y),
                    ..default()
                },
                transform: Transform::from_translation(center.extend(8.0)),
                ..default()
            },
            TextureAtlas {
                layout: sheets.enemy_layout.clone(),
                index: 0,
            },
            SpriteAnimator::new(WALK_FRAMES, WALK_FPS),
            Velocity(Vec2::new(speed, 0.0)),
            Gravity(config.enemy.gravity),
            Contacts::default(),
            Collider::from_size(body),
        ))
        .id()
}

fn patrol_enemies(mut enemies: Query<(&mut Enemy, &Transform, &Contacts, &mut Velocity)>) {
    for (mut enemy, transform, contacts, mut velocity) in &mut enemies {
        if let Some(vx) = enemy.patrol_update(transform.translation.x, *contacts) {
            velocity.x = vx;
        }
    }
}

pub fn resolve_stomps(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut enemies: Query<(Entity, &mut Enemy, &Transform, &Collider), Without<Player>>,
    mut players: Query<(&Transform, &Collider, &mut Velocity), With<Player>>,
    mut cues: EventWriter<AudioCue>,
) {
    let dt = time.delta_seconds();
    for (player_transform, player_collider, mut player_velocity) in &mut players {
        for (entity, mut enemy, transform, collider) in &mut enemies {
            let player_box = player_collider.aabb(player_transform.translation.truncate());
            let enemy_box = collider.aabb(transform.translation.truncate());
            if !enemy.is_stomp(&player_box, player_velocity.0, dt, &enemy_box) {
                continue;
            }
            if !enemy.kill_by_stomp() {
                continue;
            }

            info!("Selenite stomped at {:?}", transform.translation.truncate());
            player_velocity.y = config.enemy.stomp_bounce;
            // Dead bodies stop moving; the squash plays in place.
            commands
                .entity(entity)
                .remove::<(Velocity, SpriteAnimator)>()
                .insert(Vanish::squash(0.2, 0.2, Duration::from_millis(150)));
            cues.send(AudioCue::Stomp);
        }
    }
}

fn animate_enemies(
    time: Res<Time>,
    mut enemies: Query<(&Enemy, &mut Sprite, &mut TextureAtlas, &mut SpriteAnimator)>,
) {
    for (enemy, mut sprite, mut atlas, mut animator) in &mut enemies {
        if enemy.dead() {
            continue;
        }
        sprite.flip_x = enemy.direction() < 0.0;
        atlas.index = animator.tick(time.delta());
    }
}
