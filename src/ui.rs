//! Persistent overlay and pause menu.
//!
//! The overlay belongs to the `Ui` scene, launched once at boot. It holds the RESTART button,
//! whose visibility mirrors `RestartController` and whose stacking follows the scene draw order.
//! The pause menu is spawned and removed with the `Paused` state.

use bevy::prelude::*;

use crate::fx::full_screen;
use crate::scene::{
    RestartController, RestartRequest, SceneId, SceneMember, SceneRegistry, SceneSet,
    SceneStarted,
};
use crate::state::GameState;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Paused), spawn_pause_menu)
            .add_systems(OnExit(GameState::Paused), despawn_pause_menu)
            .add_systems(
                Update,
                (
                    build_overlay.in_set(SceneSet::Build),
                    restart_button_interaction.before(SceneSet::Flow),
                    (sync_restart_visibility, sync_overlay_layer).after(SceneSet::Signals),
                ),
            );
    }
}

const BUTTON_SIZE: Vec2 = Vec2::new(128.0, 36.0);
const BUTTON_PAD: f32 = 12.0;
/// Overlay stacking while the `Ui` scene is on top of the draw order.
const TOP_Z: i32 = 10_000;

const BUTTON_IDLE: Color = Color::srgba(0.039, 0.039, 0.039, 0.9);
const BUTTON_HOVER: Color = Color::srgb(0.059, 0.059, 0.059);
const BUTTON_BORDER: Color = Color::srgb(0.102, 0.102, 0.102);
const BUTTON_PRESSED_BORDER: Color = Color::srgb(0.0, 1.0, 0.725);

#[derive(Component)]
struct UiOverlayRoot;

#[derive(Component)]
struct RestartButton;

#[derive(Component)]
struct PauseMenu;

fn build_overlay(mut commands: Commands, mut started: EventReader<SceneStarted>) {
    for event in started.read() {
        if event.id != SceneId::Ui {
            continue;
        }

        commands
            .spawn((
                Name::new("UiOverlay"),
                SceneMember(SceneId::Ui),
                UiOverlayRoot,
                NodeBundle {
                    style: full_screen(),
                    z_index: ZIndex::Global(0),
                    ..default()
                },
            ))
            .with_children(|overlay| {
                overlay
                    .spawn((
                        Name::new("RestartButton"),
                        RestartButton,
                        ButtonBundle {
                            style: Style {
                                position_type: PositionType::Absolute,
                                top: Val::Px(BUTTON_PAD),
                                right: Val::Px(BUTTON_PAD),
                                width: Val::Px(BUTTON_SIZE.x),
                                height: Val::Px(BUTTON_SIZE.y),
                                border: UiRect::all(Val::Px(2.0)),
                                justify_content: JustifyContent::Center,
                                align_items: AlignItems::Center,
                                ..default()
                            },
                            background_color: BackgroundColor(BUTTON_IDLE),
                            border_color: BorderColor(BUTTON_BORDER),
                            visibility: Visibility::Hidden,
                            ..default()
                        },
                    ))
                    .with_children(|button| {
                        button.spawn(TextBundle::from_section(
                            "RESTART",
                            TextStyle {
                                font_size: 12.0,
                                color: Color::srgb_u8(0x00, 0xff, 0xb9),
                                ..default()
                            },
                        ));
                    });
            });
        debug!("Built ui overlay");
    }
}

/// Hover and press feedback; a press restarts to the title and un-pauses.
#[allow(clippy::type_complexity)]
fn restart_button_interaction(
    controller: Res<RestartController>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut buttons: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<RestartButton>),
    >,
    mut requests: EventWriter<RestartRequest>,
) {
    for (interaction, mut background, mut border) in &mut buttons {
        match interaction {
            Interaction::Pressed => {
                border.0 = BUTTON_PRESSED_BORDER;
                if !controller.restart_visible() {
                    continue;
                }
                info!("Restart button pressed");
                requests.send(RestartRequest(SceneId::Title));
                if *state.get() == GameState::Paused {
                    next_state.set(GameState::Playing);
                }
            }
            Interaction::Hovered => {
                background.0 = BUTTON_HOVER;
                border.0 = BUTTON_BORDER;
            }
            Interaction::None => {
                background.0 = BUTTON_IDLE;
                border.0 = BUTTON_BORDER;
            }
        }
    }
}

fn sync_restart_visibility(
    controller: Res<RestartController>,
    mut buttons: Query<&mut Visibility, With<RestartButton>>,
) {
    let wanted = if controller.restart_visible() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut buttons {
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}

fn overlay_z(registry: &SceneRegistry) -> i32 {
    match registry.layer_of(SceneId::Ui) {
        Some(_) if registry.top() == Some(SceneId::Ui) => TOP_Z,
        Some(layer) => layer as i32,
        None => 0,
    }
}

fn sync_overlay_layer(
    registry: Res<SceneRegistry>,
    mut roots: Query<&mut ZIndex, With<UiOverlayRoot>>,
) {
    let wanted = overlay_z(&registry);
    for mut z_index in &mut roots {
        if !matches!(*z_index, ZIndex::Global(current) if current == wanted) {
            *z_index = ZIndex::Global(wanted);
        }
    }
}

/// Spawns a full-screen UI node with centered text.
fn spawn_pause_menu(mut commands: Commands) {
    commands
        .spawn((
            PauseMenu,
            Name::new("PauseMenu"),
            NodeBundle {
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                style: Style {
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..full_screen()
                },
                z_index: ZIndex::Global(950),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(
                TextBundle::from_section(
                    "PAUSED\nPress ESC to resume",
                    TextStyle {
                        font_size: 36.0,
                        color: Color::srgba(0.9, 0.9, 0.9, 1.0),
                        ..default()
                    },
                )
                .with_text_justify(JustifyText::Center),
            );
        });
}

fn despawn_pause_menu(mut commands: Commands, query: Query<Entity, With<PauseMenu>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneHost;

    #[test]
    fn overlay_is_topmost_only_when_raised() {
        let mut registry = SceneRegistry::default();
        assert_eq!(overlay_z(&registry), 0);

        registry.start(SceneId::Ui);
        registry.start(SceneId::Title);
        assert_eq!(overlay_z(&registry), 0);

        registry.bring_to_top(SceneId::Ui);
        assert_eq!(overlay_z(&registry), TOP_Z);
    }

    fn button_app(state: GameState, visible: bool) -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(State::new(state))
            .init_resource::<NextState<GameState>>()
            .init_resource::<RestartController>()
            .init_resource::<SceneRegistry>()
            .add_event::<RestartRequest>()
            .add_systems(
                Update,
                (restart_button_interaction, sync_restart_visibility).chain(),
            );

        if visible {
            let mut registry = SceneRegistry::default();
            registry.start(SceneId::Ui);
            app.world_mut()
                .resource_mut::<RestartController>()
                .show_restart(&mut registry);
        }

        let button = app
            .world_mut()
            .spawn((
                RestartButton,
                Interaction::Pressed,
                BackgroundColor(BUTTON_IDLE),
                BorderColor(BUTTON_BORDER),
                Visibility::Hidden,
            ))
            .id();
        (app, button)
    }

    fn requests(app: &App) -> Vec<RestartRequest> {
        let events = app.world().resource::<Events<RestartRequest>>();
        events.get_reader().read(events).copied().collect()
    }

    #[test]
    fn pressing_restart_goes_to_title_and_resumes() {
        let (mut app, button) = button_app(GameState::Paused, true);
        app.update();

        assert_eq!(requests(&app), vec![RestartRequest(SceneId::Title)]);
        assert!(matches!(
            *app.world().resource::<NextState<GameState>>(),
            NextState::Pending(GameState::Playing)
        ));
        assert_eq!(
            app.world().get::<Visibility>(button),
            Some(&Visibility::Inherited)
        );
    }

    #[test]
    fn hidden_button_ignores_presses() {
        let (mut app, button) = button_app(GameState::Playing, false);
        app.update();

        assert!(requests(&app).is_empty());
        assert_eq!(
            app.world().get::<Visibility>(button),
            Some(&Visibility::Hidden)
        );
    }
}
