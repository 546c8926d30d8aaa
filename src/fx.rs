//! Short-lived visual effects: vanish-then-despawn, alpha fades, idle spin/bob, floating labels,
//! and screen/world flashes.
//!
//! Every effect is a component with its own `Timer`. Effects spawned on behalf of a scene carry
//! that scene's `SceneMember` tag, so tearing the scene down also cancels them.

use std::f32::consts::{PI, TAU};
use std::time::Duration;

use bevy::prelude::*;

use crate::scene::{SceneId, SceneMember};
use crate::state::{GameSet, GameState};

pub struct FxPlugin;

impl Plugin for FxPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (run_vanish, run_fades, spin, bob)
                .in_set(GameSet::Effects)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    QuadOut,
    SineOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::SineOut => (t * PI * 0.5).sin(),
        }
    }
}

/// Scales and fades a sprite towards a target, then despawns it.
#[derive(Component, Debug)]
pub struct Vanish {
    timer: Timer,
    target_scale: Vec2,
    target_alpha: f32,
    ease: Ease,
    start: Option<(Vec3, f32)>,
}

impl Vanish {
    /// Uniform grow to `scale` while fading out completely.
    pub fn pop(scale: f32, duration: Duration) -> Self {
        Self::new(Vec2::splat(scale), 0.0, duration, Ease::Linear)
    }

    /// Vertical squash with a partial fade.
    pub fn squash(scale_y: f32, alpha: f32, duration: Duration) -> Self {
        Self::new(Vec2::new(1.0, scale_y), alpha, duration, Ease::QuadOut)
    }

    fn new(target_scale: Vec2, target_alpha: f32, duration: Duration, ease: Ease) -> Self {
        Self {
            timer: Timer::new(duration, TimerMode::Once),
            target_scale,
            target_alpha,
            ease,
            start: None,
        }
    }
}

/// Drives the alpha of a sprite, UI background, or text.
#[derive(Component, Debug)]
pub struct Fade {
    timer: Timer,
    from: f32,
    to: f32,
    ease: Ease,
    despawn_when_done: bool,
}

impl Fade {
    pub fn out(duration: Duration, from: f32) -> Self {
        Self {
            timer: Timer::new(duration, TimerMode::Once),
            from,
            to: 0.0,
            ease: Ease::Linear,
            despawn_when_done: true,
        }
    }

    /// Fades in to full opacity and stays there.
    pub fn to_opaque(duration: Duration) -> Self {
        Self {
            timer: Timer::new(duration, TimerMode::Once),
            from: 0.0,
            to: 1.0,
            ease: Ease::Linear,
            despawn_when_done: false,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn finished(&self) -> bool {
        self.timer.finished()
    }

    pub fn alpha(&self) -> f32 {
        let t = self.ease.apply(self.timer.fraction());
        self.from + (self.to - self.from) * t
    }
}

/// Continuous rotation, one full turn per `period`.
#[derive(Component, Debug)]
pub struct Spin {
    period: Duration,
}

impl Spin {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

/// Up-and-back hover above a resting height.
#[derive(Component, Debug)]
pub struct Bob {
    rest_y: f32,
    amplitude: f32,
    timer: Timer,
}

impl Bob {
    /// `half_period` is the time to travel up once.
    pub fn new(rest_y: f32, amplitude: f32, half_period: Duration) -> Self {
        Self {
            rest_y,
            amplitude,
            timer: Timer::new(half_period * 2, TimerMode::Repeating),
        }
    }

    fn offset(&self) -> f32 {
        // Sine-in-out there and back, matching a yoyo tween.
        let phase = self.timer.fraction() * TAU;
        self.amplitude * (1.0 - phase.cos()) * 0.5
    }
}

pub fn spawn_floating_label(commands: &mut Commands, scene: SceneId, text: &str) {
    let mut label = TextBundle::from_section(
        text,
        TextStyle {
            font_size: 32.0,
            color: Color::srgb_u8(0xff, 0xe9, 0xb0),
            ..default()
        },
    )
    .with_text_justify(JustifyText::Center)
    .with_style(Style {
        position_type: PositionType::Absolute,
        top: Val::Px(80.0),
        width: Val::Percent(100.0),
        ..default()
    });
    label.z_index = ZIndex::Global(900);

    commands.spawn((
        Name::new("FloatingLabel"),
        SceneMember(scene),
        label,
        Fade::out(Duration::from_millis(900), 1.0).with_ease(Ease::SineOut),
    ));
}

/// Brief white wash over the whole viewport.
pub fn spawn_screen_flash(commands: &mut Commands, scene: SceneId) {
    commands.spawn((
        Name::new("ScreenFlash"),
        SceneMember(scene),
        NodeBundle {
            style: full_screen(),
            background_color: BackgroundColor(Color::WHITE.with_alpha(0.6)),
            z_index: ZIndex::Global(800),
            ..default()
        },
        Fade::out(Duration::from_millis(120), 0.6),
    ));
}

/// Translucent rectangle in world space that fades out, used for hit and boost feedback.
pub fn spawn_world_flash(
    commands: &mut Commands,
    scene: SceneId,
    center: Vec2,
    size: Vec2,
    color: Color,
    duration: Duration,
) {
    commands.spawn((
        Name::new("WorldFlash"),
        SceneMember(scene),
        SpriteBundle {
            sprite: Sprite {
                color: color.with_alpha(0.25),
                custom_size: Some(size),
                ..default()
            },
            transform: Transform::from_translation(center.extend(20.0)),
            ..default()
        },
        Fade::out(duration, 0.25),
    ));
}

/// Full-screen black overlay that fades in and stays. Returns the overlay so the caller can
/// attach whatever should happen once it is opaque.
pub fn spawn_fade_to_black(commands: &mut Commands, scene: SceneId, duration: Duration) -> Entity {
    commands
        .spawn((
            Name::new("FadeToBlack"),
            SceneMember(scene),
            NodeBundle {
                style: full_screen(),
                background_color: BackgroundColor(Color::BLACK.with_alpha(0.0)),
                z_index: ZIndex::Global(850),
                ..default()
            },
            Fade::to_opaque(duration),
        ))
        .id()
}

pub fn full_screen() -> Style {
    Style {
        position_type: PositionType::Absolute,
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        ..default()
    }
}

fn run_vanish(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Vanish, &mut Transform, Option<&mut Sprite>)>,
) {
    for (entity, mut vanish, mut transform, sprite) in &mut query {
        let start_alpha = sprite.as_ref().map_or(1.0, |s| s.color.alpha());
        let (start_scale, start_alpha) = *vanish.start.get_or_insert((transform.scale, start_alpha));

        vanish.timer.tick(time.delta());
        let t = vanish.ease.apply(vanish.timer.fraction());

        let target = start_scale * vanish.target_scale.extend(1.0);
        transform.scale = start_scale.lerp(target, t);
        if let Some(mut sprite) = sprite {
            let alpha = start_alpha + (vanish.target_alpha - start_alpha) * t;
            sprite.color.set_alpha(alpha);
        }

        if vanish.timer.finished() {
            commands.entity(entity).despawn_recursive();
        }
    }
}

#[allow(clippy::type_complexity)]
fn run_fades(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &mut Fade,
        Option<&mut Sprite>,
        Option<&mut BackgroundColor>,
        Option<&mut Text>,
    )>,
) {
    for (entity, mut fade, sprite, background, text) in &mut query {
        if fade.finished() {
            continue;
        }
        fade.timer.tick(time.delta());
        let alpha = fade.alpha();

        if let Some(mut sprite) = sprite {
            sprite.color.set_alpha(alpha);
        }
        if let Some(mut background) = background {
            background.0.set_alpha(alpha);
        }
        if let Some(mut text) = text {
            for section in &mut text.sections {
                section.style.color.set_alpha(alpha);
            }
        }

        if fade.finished() && fade.despawn_when_done {
            commands.entity(entity).despawn_recursive();
        }
    }
}

fn spin(time: Res<Time>, mut query: Query<(&Spin, &mut Transform), Without<Vanish>>) {
    for (spin, mut transform) in &mut query {
        let period = spin.period.as_secs_f32().max(f32::EPSILON);
        transform.rotate_z(-TAU * time.delta_seconds() / period);
    }
}

fn bob(time: Res<Time>, mut query: Query<(&mut Bob, &mut Transform)>) {
    for (mut bob, mut transform) in &mut query {
        bob.timer.tick(time.delta());
        transform.translation.y = bob.rest_y + bob.offset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_hits_endpoints() {
        for ease in [Ease::Linear, Ease::QuadOut, Ease::SineOut] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
            assert!(ease.apply(2.0) <= 1.0);
        }
        assert!(Ease::QuadOut.apply(0.5) > 0.5);
    }

    #[test]
    fn fade_alpha_tracks_timer() {
        let mut fade = Fade::out(Duration::from_millis(100), 0.8);
        assert!((fade.alpha() - 0.8).abs() < 1e-6);
        fade.timer.tick(Duration::from_millis(50));
        assert!((fade.alpha() - 0.4).abs() < 1e-6);
        fade.timer.tick(Duration::from_millis(50));
        assert!(fade.finished());
        assert_eq!(fade.alpha(), 0.0);
    }

    #[test]
    fn bob_returns_to_rest() {
        let mut bob = Bob::new(100.0, 6.0, Duration::from_millis(900));
        assert_eq!(bob.offset(), 0.0);
        bob.timer.tick(Duration::from_millis(900));
        assert!((bob.offset() - 6.0).abs() < 1e-4);
        bob.timer.tick(Duration::from_millis(899));
        assert!(bob.offset() < 0.01);
    }

    #[test]
    fn vanish_despawns_when_done() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, run_vanish);

        // Zero duration finishes on the first tick regardless of frame delta.
        let entity = app
            .world_mut()
            .spawn((Transform::default(), Vanish::pop(1.6, Duration::ZERO)))
            .id();

        app.update();
        assert!(app.world().get_entity(entity).is_none());
    }
}
