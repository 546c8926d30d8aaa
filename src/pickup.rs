//! Overlap-triggered pickups: the star, jump boots, and the invincibility orb.
//!
//! A pickup knows nothing about what it does. The effect is a `PowerupEffect` value handed over
//! at spawn time and dispatched by the player. Removal is animated, so a pickup can overlap the
//! player for several more frames after it fires; the `consumed` flag and the immediate removal
//! of its `PickupSensor` both make sure the effect lands only once.

use std::time::Duration;

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::config::PickupConfig;
use crate::fx::{self, Bob, Spin, Vanish};
use crate::physics::Collider;
use crate::player::Player;
use crate::scene::{SceneId, SceneMember};
use crate::sprites::SpriteSheets;
use crate::state::{GameSet, GameState};

pub struct PickupPlugin;

impl Plugin for PickupPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Score>().add_systems(
            Update,
            collect_pickups
                .in_set(GameSet::Interactions)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerupEffect {
    ScoreBonus(u32),
    JumpBoost { multiplier: f32, duration: Duration },
    Invincibility { duration: Duration },
}

impl PowerupEffect {
    pub fn label(&self) -> String {
        match self {
            PowerupEffect::ScoreBonus(points) => format!("+{points}"),
            PowerupEffect::JumpBoost { .. } => "JUMP BOOST!".to_owned(),
            PowerupEffect::Invincibility { .. } => "INVINCIBLE!".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Star,
    JumpBoots,
    InvincibilityOrb,
}

impl PickupKind {
    pub fn effect(self, config: &PickupConfig) -> PowerupEffect {
        match self {
            PickupKind::Star => PowerupEffect::ScoreBonus(config.star_points),
            PickupKind::JumpBoots => PowerupEffect::JumpBoost {
                multiplier: config.boots_multiplier,
                duration: Duration::from_millis(config.boots_ms),
            },
            PickupKind::InvincibilityOrb => PowerupEffect::Invincibility {
                duration: Duration::from_millis(config.invincibility_ms),
            },
        }
    }

    fn size(self) -> Vec2 {
        match self {
            PickupKind::Star => Vec2::splat(24.0),
            PickupKind::JumpBoots | PickupKind::InvincibilityOrb => Vec2::splat(18.0),
        }
    }

    fn pop_scale(self) -> f32 {
        match self {
            PickupKind::Star => 1.6,
            PickupKind::JumpBoots | PickupKind::InvincibilityOrb => 1.4,
        }
    }

    fn color(self) -> Color {
        match self {
            PickupKind::Star => Color::srgb_u8(0xff, 0xf1, 0xa8),
            PickupKind::JumpBoots => Color::srgb_u8(0x60, 0xff, 0xa8),
            PickupKind::InvincibilityOrb => Color::srgb_u8(0xff, 0xe0, 0x66),
        }
    }
}

#[derive(Component, Debug)]
pub struct Pickup {
    pub kind: PickupKind,
    effect: PowerupEffect,
    consumed: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, effect: PowerupEffect) -> Self {
        Self {
            kind,
            effect,
            consumed: false,
        }
    }

    pub fn consumed(&self) -> bool {
        self.consumed
    }

    /// Yields the effect the first time only.
    pub fn try_consume(&mut self) -> Option<PowerupEffect> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        Some(self.effect)
    }
}

/// Arms a pickup against one player. Removed the moment the pickup fires.
#[derive(Component, Debug, Clone, Copy)]
pub struct PickupSensor {
    pub player: Entity,
}

/// Running total of score bonuses, shown in the HUD and reset on the title screen.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(pub u32);

pub fn enable_pickup(commands: &mut Commands, pickup: Entity, player: Entity) {
    commands.entity(pickup).insert(PickupSensor { player });
}

pub fn spawn_pickup(
    commands: &mut Commands,
    scene: SceneId,
    kind: PickupKind,
    position: Vec2,
    config: &PickupConfig,
    sheets: &SpriteSheets,
) -> Entity {
    let size = kind.size();
    let texture = match kind {
        PickupKind::Star => sheets.star.clone(),
        PickupKind::JumpBoots | PickupKind::InvincibilityOrb => sheets.orb.clone(),
    };

    let mut entity = commands.spawn((
        Name::new(format!("{kind:?}")),
        SceneMember(scene),
        Pickup::new(kind, kind.effect(config)),
        SpriteBundle {
            texture,
            sprite: Sprite {
                color: kind.color(),
                custom_size: Some(size),
                ..default()
            },
            transform: Transform::from_translation(position.extend(5.0)),
            ..default()
        },
        Collider::from_size(size),
    ));

    match kind {
        PickupKind::Star => entity.insert(Spin::new(Duration::from_millis(3000))),
        PickupKind::JumpBoots | PickupKind::InvincibilityOrb => {
            entity.insert(Bob::new(position.y, 6.0, Duration::from_millis(900)))
        }
    };

    entity.id()
}

#[allow(clippy::type_complexity)]
fn collect_pickups(
    mut commands: Commands,
    mut players: Query<(&Transform, &Collider, &mut Player)>,
    mut pickups: Query<(
        Entity,
        &Transform,
        &Collider,
        &mut Pickup,
        &PickupSensor,
        &SceneMember,
    )>,
    mut score: ResMut<Score>,
    mut cues: EventWriter<AudioCue>,
) {
    for (entity, transform, collider, mut pickup, sensor, member) in &mut pickups {
        let Ok((player_transform, player_collider, mut player)) = players.get_mut(sensor.player)
        else {
            continue;
        };

        let player_box = player_collider.aabb(player_transform.translation.truncate());
        let pickup_box = collider.aabb(transform.translation.truncate());
        if !player_box.intersects(&pickup_box) {
            continue;
        }

        let Some(effect) = pickup.try_consume() else {
            continue;
        };

        commands
            .entity(entity)
            .remove::<PickupSensor>()
            .remove::<Bob>()
            .insert(Vanish::pop(pickup.kind.pop_scale(), Duration::from_millis(180)));

        score.0 += player.apply_effect(effect);
        info!("Picked up {:?}: {:?}", pickup.kind, effect);

        fx::spawn_floating_label(&mut commands, member.0, &effect.label());
        fx::spawn_screen_flash(&mut commands, member.0);
        if let PowerupEffect::JumpBoost { .. } = effect {
            let size = player_collider.half_extents * 2.0 + Vec2::splat(8.0);
            fx::spawn_world_flash(
                &mut commands,
                member.0,
                player_transform.translation.truncate(),
                size,
                Color::srgb_u8(0x9a, 0xe6, 0xb4),
                Duration::from_millis(220),
            );
        }
        cues.send(AudioCue::Pickup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> Pickup {
        Pickup::new(PickupKind::Star, PowerupEffect::ScoreBonus(100))
    }

    #[test]
    fn try_consume_is_one_shot() {
        let mut pickup = star();
        assert_eq!(pickup.try_consume(), Some(PowerupEffect::ScoreBonus(100)));
        assert!(pickup.consumed());
        for _ in 0..5 {
            assert_eq!(pickup.try_consume(), None);
        }
    }

    #[test]
    fn kinds_map_to_configured_effects() {
        let config = PickupConfig::default();
        assert_eq!(
            PickupKind::Star.effect(&config),
            PowerupEffect::ScoreBonus(100)
        );
        assert_eq!(
            PickupKind::JumpBoots.effect(&config),
            PowerupEffect::JumpBoost {
                multiplier: 1.2,
                duration: Duration::from_millis(1000)
            }
        );
        assert_eq!(
            PickupKind::InvincibilityOrb.effect(&config),
            PowerupEffect::Invincibility {
                duration: Duration::from_millis(4000)
            }
        );
    }

    fn app_with_player_and(pickup: Pickup) -> (App, Entity, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_event::<AudioCue>();
        app.init_resource::<Score>();
        app.add_systems(Update, collect_pickups);

        let player = app
            .world_mut()
            .spawn((
                Transform::from_xyz(100.0, 60.0, 0.0),
                Collider::from_size(Vec2::new(28.0, 40.0)),
                Player::new(180.0, 360.0),
            ))
            .id();
        let item = app
            .world_mut()
            .spawn((
                SceneMember(SceneId::Club),
                Transform::from_xyz(105.0, 70.0, 0.0),
                Collider::from_size(Vec2::splat(24.0)),
                pickup,
                PickupSensor { player },
            ))
            .id();
        (app, player, item)
    }

    #[test]
    fn overlapping_on_consecutive_frames_applies_once() {
        let (mut app, _player, item) = app_with_player_and(star());

        app.update();
        app.update();
        app.update();

        assert_eq!(app.world().resource::<Score>().0, 100);
        assert!(app.world().get::<PickupSensor>(item).is_none());
        assert!(app.world().get::<Vanish>(item).is_some());
    }

    #[test]
    fn consumed_flag_guards_a_still_armed_sensor() {
        let mut pickup = star();
        pickup.try_consume();
        let (mut app, _player, item) = app_with_player_and(pickup);

        app.update();

        assert_eq!(app.world().resource::<Score>().0, 0);
        // Nothing fired, so nothing disarmed it either.
        assert!(app.world().get::<PickupSensor>(item).is_some());
    }

    #[test]
    fn boots_boost_the_player_once() {
        let boots = Pickup::new(
            PickupKind::JumpBoots,
            PowerupEffect::JumpBoost {
                multiplier: 1.2,
                duration: Duration::from_millis(1000),
            },
        );
        let (mut app, player, _item) = app_with_player_and(boots);

        app.update();
        app.update();

        let player = app.world().get::<Player>(player).unwrap();
        assert_eq!(player.jump_boost(), 1.2);
        assert_eq!(app.world().resource::<Score>().0, 0);
    }

    #[test]
    fn no_overlap_no_effect() {
        let (mut app, player, item) = app_with_player_and(star());
        app.world_mut()
            .get_mut::<Transform>(player)
            .unwrap()
            .translation
            .x = 400.0;

        app.update();

        assert_eq!(app.world().resource::<Score>().0, 0);
        assert!(!app.world().get::<Pickup>(item).unwrap().consumed());
    }
}
