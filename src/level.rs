//! Gameplay levels: layouts, assembly on scene start, and the rules that belong to a level rather
//! than to any one entity (side hits, the exit door, the HUD).
//!
//! Layouts are authored in world units with the origin at the bottom-left of the level and y up.
//! Horizontal positions scale with the viewport width; heights are fixed offsets from the floor.

use std::time::Duration;

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::config::GameConfig;
use crate::enemy::{resolve_stomps, spawn_enemy, Enemy, PatrolRange};
use crate::fx::{self, Fade};
use crate::physics::{Collider, Solid, Velocity, WorldBounds};
use crate::pickup::{enable_pickup, spawn_pickup, PickupKind, Score};
use crate::player::{spawn_player, Player};
use crate::scene::{RestartRequest, SceneId, SceneMember, SceneSet, SceneStarted, UiSignal};
use crate::sprites::SpriteSheets;
use crate::state::{GameSet, GameState};

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, assemble_level.in_set(SceneSet::Build))
            .add_systems(
                Update,
                (
                    return_to_title.in_set(GameSet::Input),
                    (resolve_side_hits.after(resolve_stomps), enter_exit_door)
                        .in_set(GameSet::Interactions),
                    finish_transitions.in_set(GameSet::Effects),
                )
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Update, update_score_text.after(SceneSet::Build));
    }
}

const EXIT_FADE: Duration = Duration::from_millis(300);
const HIT_FLASH: Duration = Duration::from_millis(180);
/// Height of the star's center above the top of the highest platform.
const STAR_LIFT: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformSpec {
    pub center: Vec2,
    pub size: Vec2,
}

impl PlatformSpec {
    fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.size.y * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpec {
    /// Where the feet start; the body settles under gravity.
    pub feet: Vec2,
    pub patrol: PatrolRange,
    pub speed: f32,
}

impl EnemySpec {
    fn new(x: f32, y: f32, min: f32, max: f32, speed: f32) -> Self {
        Self {
            feet: Vec2::new(x, y),
            patrol: PatrolRange { min, max },
            speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitSpec {
    pub center: Vec2,
    pub size: Vec2,
    pub target: SceneId,
}

#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub scene: SceneId,
    pub name: &'static str,
    pub world_size: Vec2,
    pub background: Color,
    pub platform_color: Color,
    pub platforms: Vec<PlatformSpec>,
    /// Where the player's feet start, like `EnemySpec::feet`.
    pub player_feet: Vec2,
    /// Everything except the star, which is always placed on the highest platform.
    pub pickups: Vec<(PickupKind, Vec2)>,
    pub enemies: Vec<EnemySpec>,
    pub exit: Option<ExitSpec>,
    /// `B` goes back to the title.
    pub title_shortcut: bool,
}

impl LevelLayout {
    pub fn for_scene(scene: SceneId, viewport: Vec2) -> Option<Self> {
        match scene {
            SceneId::Club => Some(Self::club(viewport)),
            SceneId::Foundry => Some(Self::foundry(viewport)),
            SceneId::Title | SceneId::Ui => None,
        }
    }

    /// Scene 1: a wide nightclub street, three screens across, with an exit at the far end.
    pub fn club(viewport: Vec2) -> Self {
        let w = viewport.x;
        let world = Vec2::new(w * 3.0, viewport.y);

        Self {
            scene: SceneId::Club,
            name: "Scene 1: The Club",
            world_size: world,
            background: Color::srgb_u8(0x0a, 0x0a, 0x12),
            platform_color: Color::srgb_u8(0x2e, 0x2e, 0x3a),
            platforms: vec![
                PlatformSpec::new(world.x * 0.5, 20.0, world.x, 40.0),
                PlatformSpec::new(w * 0.5, 120.0, 160.0, 20.0),
                PlatformSpec::new(w * 0.8, 140.0, 180.0, 20.0),
                PlatformSpec::new(w * 1.1, 160.0, 140.0, 20.0),
                PlatformSpec::new(w * 1.4, 180.0, 140.0, 20.0),
                PlatformSpec::new(w * 1.8, 200.0, 140.0, 20.0),
                PlatformSpec::new(w * 2.2, 260.0, 140.0, 20.0),
            ],
            player_feet: Vec2::new(80.0, 80.0),
            pickups: vec![(PickupKind::JumpBoots, Vec2::new(w * 1.3, 246.0))],
            enemies: vec![
                EnemySpec::new(360.0, 60.0, 260.0, 520.0, 55.0),
                EnemySpec::new(w * 1.3, 232.0, w * 1.1, w * 1.45, 70.0),
                EnemySpec::new(world.x - 200.0, 60.0, world.x - 320.0, world.x - 80.0, 60.0),
            ],
            exit: Some(ExitSpec {
                center: Vec2::new(world.x - 40.0, 60.0),
                size: Vec2::new(24.0, 80.0),
                target: SceneId::Foundry,
            }),
            title_shortcut: false,
        }
    }

    /// Scene 2: a single-screen foundry with catwalks.
    pub fn foundry(viewport: Vec2) -> Self {
        let w = viewport.x;

        Self {
            scene: SceneId::Foundry,
            name: "Scene 2: The Foundry",
            world_size: viewport,
            background: Color::srgb_u8(0x0f, 0x0b, 0x0a),
            platform_color: Color::srgb_u8(0x3a, 0x2e, 0x2e),
            platforms: vec![
                PlatformSpec::new(w * 0.5, 20.0, w, 40.0),
                PlatformSpec::new(w * 0.2, 110.0, 140.0, 18.0),
                PlatformSpec::new(w * 0.5, 160.0, 180.0, 18.0),
                PlatformSpec::new(w * 0.8, 190.0, 160.0, 18.0),
            ],
            player_feet: Vec2::new(40.0, 80.0),
            pickups: vec![
                (PickupKind::JumpBoots, Vec2::new(w * 0.5 + 40.0, 242.0)),
                (PickupKind::InvincibilityOrb, Vec2::new(w * 0.2, 162.0)),
            ],
            enemies: vec![
                EnemySpec::new(w * 0.35, 60.0, w * 0.2, w * 0.45, 55.0),
                EnemySpec::new(w * 0.5, 232.0, w * 0.42, w * 0.66, 65.0),
                EnemySpec::new(w * 0.8, 312.0, w * 0.72, w * 0.9, 60.0),
            ],
            exit: None,
            title_shortcut: true,
        }
    }

    pub fn star_position(&self) -> Option<Vec2> {
        self.platforms
            .iter()
            .max_by(|a, b| a.top().total_cmp(&b.top()))
            .map(|top| Vec2::new(top.center.x, top.top() + STAR_LIFT))
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            min: Vec2::ZERO,
            max: self.world_size,
        }
    }
}

#[derive(Component, Debug)]
pub struct ExitDoor {
    pub target: SceneId,
    exiting: bool,
}

impl ExitDoor {
    pub fn new(target: SceneId) -> Self {
        Self {
            target,
            exiting: false,
        }
    }

    #[cfg(test)]
    fn exiting(&self) -> bool {
        self.exiting
    }
}

/// Sits on a fade-to-black overlay; once the fade completes the scene switches.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingTransition(pub SceneId);

/// Present in scenes where `B` returns to the title.
#[derive(Component, Debug)]
pub struct TitleShortcut;

#[derive(Component, Debug)]
pub struct ScoreText;

fn assemble_level(
    mut commands: Commands,
    mut started: EventReader<SceneStarted>,
    config: Res<GameConfig>,
    sheets: Res<SpriteSheets>,
    mut bounds: ResMut<WorldBounds>,
    mut clear_color: ResMut<ClearColor>,
    mut signals: EventWriter<UiSignal>,
) {
    let viewport = Vec2::new(config.window.width, config.window.height);
    for event in started.read() {
        let Some(layout) = LevelLayout::for_scene(event.id, viewport) else {
            continue;
        };

        *bounds = layout.bounds();
        clear_color.0 = layout.background;
        build_level(&mut commands, &layout, &config, &sheets);
        signals.send(UiSignal::ShowRestart);
        info!("Assembled {} (generation {})", layout.name, event.generation);
    }
}

/// Spawns every entity of a level and returns the player.
pub fn build_level(
    commands: &mut Commands,
    layout: &LevelLayout,
    config: &GameConfig,
    sheets: &SpriteSheets,
) -> Entity {
    let scene = layout.scene;

    for platform in &layout.platforms {
        commands.spawn((
            Name::new("Platform"),
            SceneMember(scene),
            SpriteBundle {
                sprite: Sprite {
                    color: layout.platform_color,
                    custom_size: Some(platform.size),
                    ..default()
                },
                transform: Transform::from_translation(platform.center.extend(1.0)),
                ..default()
            },
            Collider::from_size(platform.size),
            Solid,
        ));
    }

    let player = spawn_player(commands, scene, layout.player_feet, config, sheets);

    let star = layout
        .star_position()
        .map(|position| (PickupKind::Star, position));
    for (kind, position) in star.into_iter().chain(layout.pickups.iter().copied()) {
        let pickup = spawn_pickup(commands, scene, kind, position, &config.pickups, sheets);
        enable_pickup(commands, pickup, player);
    }

    for spec in &layout.enemies {
        spawn_enemy(commands, scene, spec.feet, spec.patrol, spec.speed, config, sheets);
    }

    if let Some(exit) = layout.exit {
        spawn_exit(commands, scene, exit);
    }

    spawn_hud(commands, layout);
    player
}

fn spawn_exit(commands: &mut Commands, scene: SceneId, exit: ExitSpec) {
    let glow = Color::srgb_u8(0x6e, 0xe7, 0xb7);
    commands.spawn((
        Name::new("ExitDoor"),
        SceneMember(scene),
        ExitDoor::new(exit.target),
        SpriteBundle {
            sprite: Sprite {
                color: glow.with_alpha(0.3),
                custom_size: Some(exit.size),
                ..default()
            },
            transform: Transform::from_translation(exit.center.extend(2.0)),
            ..default()
        },
        Collider::from_size(exit.size),
    ));

    commands.spawn((
        Name::new("ExitLabel"),
        SceneMember(scene),
        Text2dBundle {
            text: Text::from_section(
                "EXIT >",
                TextStyle {
                    font_size: 14.0,
                    color: Color::srgb_u8(0xa7, 0xf3, 0xd0),
                    ..default()
                },
            ),
            transform: Transform::from_translation(
                (exit.center + Vec2::new(-30.0, exit.size.y * 0.5 + 14.0)).extend(2.0),
            ),
            ..default()
        },
    ));
}

fn spawn_hud(commands: &mut Commands, layout: &LevelLayout) {
    let mut root = commands.spawn((
        Name::new("Hud"),
        SceneMember(layout.scene),
        NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                left: Val::Px(16.0),
                top: Val::Px(16.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(6.0),
                ..default()
            },
            ..default()
        },
    ));
    if layout.title_shortcut {
        root.insert(TitleShortcut);
    }

    root.with_children(|hud| {
        hud.spawn(TextBundle::from_section(
            layout.name,
            TextStyle {
                font_size: 20.0,
                color: Color::WHITE,
                ..default()
            },
        ));
        hud.spawn((
            ScoreText,
            TextBundle::from_section(
                "",
                TextStyle {
                    font_size: 16.0,
                    color: Color::srgb_u8(0xff, 0xe9, 0xb0),
                    ..default()
                },
            ),
        ));
    });
}

/// Touching a live enemy from the side knocks the player away and grants a short invincibility
/// window. Runs after stomps, so an enemy stomped this frame is already dead here.
fn resolve_side_hits(
    mut commands: Commands,
    config: Res<GameConfig>,
    enemies: Query<(&Enemy, &Transform, &Collider), Without<Player>>,
    mut players: Query<(&mut Player, &Transform, &Collider, &mut Velocity, &SceneMember)>,
    mut cues: EventWriter<AudioCue>,
) {
    for (mut player, player_transform, player_collider, mut velocity, member) in &mut players {
        if player.invincible() {
            continue;
        }
        let player_pos = player_transform.translation.truncate();
        let player_box = player_collider.aabb(player_pos);

        let hit = enemies
            .iter()
            .filter(|(enemy, ..)| enemy.hits_player())
            .map(|(_, transform, collider)| collider.aabb(transform.translation.truncate()))
            .find(|enemy_box| player_box.intersects(enemy_box));
        let Some(enemy_box) = hit else {
            continue;
        };

        let away = if player_pos.x < enemy_box.center().x {
            -1.0
        } else {
            1.0
        };
        let knockback = config.player.knockback;
        velocity.0 = Vec2::new(away * knockback.x, knockback.y);
        player.grant_invincibility(config.player.hit_invincibility());

        fx::spawn_world_flash(
            &mut commands,
            member.0,
            player_pos,
            Vec2::new(40.0, 50.0),
            Color::srgb(1.0, 0.0, 0.0),
            HIT_FLASH,
        );
        cues.send(AudioCue::Hit);
        info!("Player hit at {player_pos:?}");
    }
}

fn enter_exit_door(
    mut commands: Commands,
    players: Query<(&Transform, &Collider), With<Player>>,
    mut doors: Query<(&mut ExitDoor, &Transform, &Collider, &SceneMember), Without<Player>>,
) {
    for (mut door, transform, collider, member) in &mut doors {
        if door.exiting {
            continue;
        }
        let door_box = collider.aabb(transform.translation.truncate());
        let reached = players.iter().any(|(player_transform, player_collider)| {
            player_collider
                .aabb(player_transform.translation.truncate())
                .intersects(&door_box)
        });
        if !reached {
            continue;
        }

        door.exiting = true;
        let overlay = fx::spawn_fade_to_black(&mut commands, member.0, EXIT_FADE);
        commands.entity(overlay).insert(PendingTransition(door.target));
        info!("Exit reached; heading to {}", door.target.key());
    }
}

fn finish_transitions(
    mut commands: Commands,
    overlays: Query<(Entity, &Fade, &PendingTransition)>,
    mut requests: EventWriter<RestartRequest>,
) {
    for (entity, fade, transition) in &overlays {
        if !fade.finished() {
            continue;
        }
        commands.entity(entity).remove::<PendingTransition>();
        requests.send(RestartRequest(transition.0));
    }
}

fn return_to_title(
    keyboard: Res<ButtonInput<KeyCode>>,
    shortcuts: Query<(), With<TitleShortcut>>,
    mut requests: EventWriter<RestartRequest>,
) {
    if shortcuts.is_empty() || !keyboard.just_pressed(KeyCode::KeyB) {
        return;
    }
    requests.send(RestartRequest(SceneId::Title));
}

fn update_score_text(score: Res<Score>, mut texts: Query<&mut Text, With<ScoreText>>) {
    let value = format!("SCORE {:05}", score.0);
    for mut text in &mut texts {
        let Some(section) = text.sections.first_mut() else {
            continue;
        };
        if section.value != value {
            section.value.clone_from(&value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pickup::Pickup;
    use crate::scene::{RestartController, SceneRegistry, ScenePlugin};

    const VIEW: Vec2 = Vec2::new(960.0, 540.0);

    fn layouts() -> [LevelLayout; 2] {
        [LevelLayout::club(VIEW), LevelLayout::foundry(VIEW)]
    }

    fn sheets() -> SpriteSheets {
        SpriteSheets {
            player: Handle::default(),
            player_layout: Handle::default(),
            enemy: Handle::default(),
            enemy_layout: Handle::default(),
            star: Handle::default(),
            orb: Handle::default(),
        }
    }

    #[test]
    fn star_sits_above_the_highest_platform() {
        assert_eq!(
            LevelLayout::club(VIEW).star_position(),
            Some(Vec2::new(2112.0, 282.0))
        );
        assert_eq!(
            LevelLayout::foundry(VIEW).star_position(),
            Some(Vec2::new(768.0, 211.0))
        );
    }

    #[test]
    fn content_stays_inside_the_world() {
        for layout in layouts() {
            let inside = |p: Vec2| p.x >= 0.0 && p.x <= layout.world_size.x && p.y >= 0.0;
            assert!(inside(layout.player_feet), "{}", layout.name);
            assert!(layout.pickups.iter().all(|(_, p)| inside(*p)), "{}", layout.name);
            for enemy in &layout.enemies {
                assert!(inside(enemy.feet), "{}", layout.name);
                assert!(enemy.patrol.min < enemy.patrol.max, "{}", layout.name);
            }
        }
        assert_eq!(LevelLayout::club(VIEW).world_size.x, 2880.0);
        assert!(LevelLayout::foundry(VIEW).exit.is_none());
    }

    #[test]
    fn only_gameplay_scenes_have_layouts() {
        assert!(LevelLayout::for_scene(SceneId::Title, VIEW).is_none());
        assert!(LevelLayout::for_scene(SceneId::Ui, VIEW).is_none());
        assert!(LevelLayout::for_scene(SceneId::Foundry, VIEW).is_some());
    }

    fn scene_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_event::<AudioCue>()
            .init_resource::<GameConfig>()
            .init_resource::<WorldBounds>()
            .init_resource::<ClearColor>()
            .insert_resource(sheets())
            .add_plugins(ScenePlugin)
            .configure_sets(
                Update,
                (SceneSet::Flow, SceneSet::Build, SceneSet::Signals).chain(),
            )
            .add_systems(Update, assemble_level.in_set(SceneSet::Build));
        app
    }

    fn count<C: Component>(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<(), With<C>>()
            .iter(app.world())
            .count()
    }

    fn stars(app: &mut App) -> usize {
        app.world_mut()
            .query::<&Pickup>()
            .iter(app.world())
            .filter(|p| p.kind == PickupKind::Star)
            .count()
    }

    #[test]
    fn each_level_has_exactly_one_star_across_restarts() {
        let mut app = scene_app();
        app.update();

        for target in [SceneId::Club, SceneId::Club, SceneId::Foundry, SceneId::Foundry] {
            app.world_mut().send_event(RestartRequest(target));
            app.update();

            assert_eq!(stars(&mut app), 1, "{target:?}");
            assert_eq!(count::<Player>(&mut app), 1, "{target:?}");
            assert_eq!(count::<Enemy>(&mut app), 3, "{target:?}");
        }

        assert_eq!(app.world().resource::<WorldBounds>().max, VIEW);
        assert!(app.world().resource::<RestartController>().restart_visible());
        assert_eq!(
            app.world().resource::<SceneRegistry>().top(),
            Some(SceneId::Ui)
        );
    }

    #[test]
    fn club_assembles_platforms_and_exit() {
        let mut app = scene_app();
        app.update();
        app.world_mut().send_event(RestartRequest(SceneId::Club));
        app.update();

        assert_eq!(count::<Solid>(&mut app), 7);
        assert_eq!(count::<ExitDoor>(&mut app), 1);
        assert_eq!(count::<TitleShortcut>(&mut app), 0);
        assert_eq!(app.world().resource::<WorldBounds>().max.x, 2880.0);
    }

    fn feet<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> Vec<Vec2> {
        app.world_mut()
            .query_filtered::<(&Transform, &Collider), F>()
            .iter(app.world())
            .map(|(transform, collider)| {
                let body = collider.aabb(transform.translation.truncate());
                Vec2::new(body.center().x, body.bottom())
            })
            .collect()
    }

    #[test]
    fn player_and_enemies_spawn_standing_on_their_feet() {
        let mut app = scene_app();
        app.update();
        app.world_mut().send_event(RestartRequest(SceneId::Club));
        app.update();

        let layout = LevelLayout::club(VIEW);
        let player = feet::<With<Player>>(&mut app);
        assert_eq!(player.len(), 1);
        assert!(player[0].abs_diff_eq(layout.player_feet, 1e-3), "{player:?}");

        let mut enemies = feet::<With<Enemy>>(&mut app);
        enemies.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert_eq!(enemies.len(), layout.enemies.len());
        for (actual, spec) in enemies.iter().zip(&layout.enemies) {
            assert!(actual.abs_diff_eq(spec.feet, 1e-3), "{actual:?} vs {:?}", spec.feet);
        }
    }

    fn hit_app() -> (App, Entity, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_event::<AudioCue>()
            .init_resource::<GameConfig>()
            .add_systems(Update, resolve_side_hits);

        let enemy = app
            .world_mut()
            .spawn((
                Enemy::new(
                    PatrolRange {
                        min: 0.0,
                        max: 500.0,
                    },
                    55.0,
                    &GameConfig::default().enemy,
                ),
                Transform::from_xyz(300.0, 54.0, 0.0),
                Collider::from_size(Vec2::new(24.0, 28.0)),
            ))
            .id();
        let player = app
            .world_mut()
            .spawn((
                SceneMember(SceneId::Club),
                Player::new(180.0, 360.0),
                Transform::from_xyz(285.0, 60.0, 0.0),
                Collider::from_size(Vec2::new(28.0, 40.0)),
                Velocity(Vec2::new(180.0, 0.0)),
            ))
            .id();
        (app, player, enemy)
    }

    #[test]
    fn side_hit_knocks_the_player_away_once() {
        let (mut app, player, _enemy) = hit_app();
        app.update();

        let velocity = app.world().get::<Velocity>(player).unwrap().0;
        assert_eq!(velocity, Vec2::new(-220.0, 220.0));
        assert!(app.world().get::<Player>(player).unwrap().invincible());

        // Still overlapping next frame, but invincible now.
        app.world_mut().get_mut::<Velocity>(player).unwrap().0 = Vec2::ZERO;
        app.update();
        assert_eq!(app.world().get::<Velocity>(player).unwrap().0, Vec2::ZERO);
    }

    #[test]
    fn dead_enemy_does_no_damage() {
        let (mut app, player, enemy) = hit_app();
        app.world_mut()
            .get_mut::<Enemy>(enemy)
            .unwrap()
            .kill_by_stomp();
        app.update();

        assert_eq!(
            app.world().get::<Velocity>(player).unwrap().0,
            Vec2::new(180.0, 0.0)
        );
        assert!(!app.world().get::<Player>(player).unwrap().invincible());
    }

    #[test]
    fn stomp_wins_over_side_hit_in_the_same_frame() {
        let (mut app, player, enemy) = hit_app();
        app.add_systems(Update, resolve_stomps.before(resolve_side_hits));
        {
            let world = app.world_mut();
            world.get_mut::<Transform>(player).unwrap().translation = Vec3::new(305.0, 85.0, 0.0);
            world.get_mut::<Velocity>(player).unwrap().0 = Vec2::new(0.0, -240.0);
        }

        app.update();

        assert!(app.world().get::<Enemy>(enemy).unwrap().dead());
        assert_eq!(
            app.world().get::<Velocity>(player).unwrap().0,
            Vec2::new(0.0, GameConfig::default().enemy.stomp_bounce)
        );
        assert!(!app.world().get::<Player>(player).unwrap().invincible());
    }

    #[test]
    fn exit_door_fires_once() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, enter_exit_door);

        let door = app
            .world_mut()
            .spawn((
                SceneMember(SceneId::Club),
                ExitDoor::new(SceneId::Foundry),
                Transform::from_xyz(100.0, 60.0, 0.0),
                Collider::from_size(Vec2::new(24.0, 80.0)),
            ))
            .id();
        app.world_mut().spawn((
            Player::new(180.0, 360.0),
            Transform::from_xyz(110.0, 60.0, 0.0),
            Collider::from_size(Vec2::new(28.0, 40.0)),
        ));

        for _ in 0..3 {
            app.update();
        }

        assert!(app.world().get::<ExitDoor>(door).unwrap().exiting());
        assert_eq!(count::<PendingTransition>(&mut app), 1);
    }
}
