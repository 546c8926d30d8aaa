//! Title screen: a heading, a prompt, and any click or Enter/Space to begin.

use bevy::prelude::*;

use crate::pickup::Score;
use crate::scene::{
    RestartRequest, SceneHost, SceneId, SceneMember, SceneRegistry, SceneSet, SceneStarted,
    UiSignal,
};
use crate::state::GameSet;

pub struct TitlePlugin;

impl Plugin for TitlePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                build_title.in_set(SceneSet::Build),
                start_from_title.in_set(GameSet::Input),
            ),
        );
    }
}

fn build_title(
    mut commands: Commands,
    mut started: EventReader<SceneStarted>,
    mut score: ResMut<Score>,
    mut clear_color: ResMut<ClearColor>,
    mut signals: EventWriter<UiSignal>,
) {
    let title_started = started
        .read()
        .fold(false, |seen, event| seen || event.id == SceneId::Title);
    if !title_started {
        return;
    }

    score.0 = 0;
    clear_color.0 = Color::BLACK;
    signals.send(UiSignal::HideRestart);

    commands
        .spawn((
            Name::new("TitleScreen"),
            SceneMember(SceneId::Title),
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    row_gap: Val::Px(24.0),
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(
                TextBundle::from_section(
                    "A Trip to the Moon",
                    TextStyle {
                        font_size: 48.0,
                        color: Color::srgb_u8(0xff, 0xe9, 0xb0),
                        ..default()
                    },
                )
                .with_text_justify(JustifyText::Center),
            );
            parent.spawn(
                TextBundle::from_section(
                    "Click to begin: Scene 1 - The Club",
                    TextStyle {
                        font_size: 20.0,
                        color: Color::srgb(0.9, 0.9, 0.9),
                        ..default()
                    },
                )
                .with_text_justify(JustifyText::Center),
            );
        });
}

fn start_from_title(
    registry: Res<SceneRegistry>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut requests: EventWriter<RestartRequest>,
) {
    if !registry.scene(SceneId::Title).is_some_and(|r| r.is_active()) {
        return;
    }
    let pressed = mouse.just_pressed(MouseButton::Left)
        || keyboard.any_just_pressed([KeyCode::Enter, KeyCode::Space]);
    if pressed {
        info!("Starting from title");
        requests.send(RestartRequest(SceneId::Club));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<SceneRegistry>()
            .init_resource::<Score>()
            .init_resource::<ClearColor>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .add_event::<SceneStarted>()
            .add_event::<UiSignal>()
            .add_event::<RestartRequest>()
            .add_systems(Update, (start_from_title, build_title));
        app
    }

    fn sent<E: Event + Clone>(app: &App) -> Vec<E> {
        let events = app.world().resource::<Events<E>>();
        events.get_reader().read(events).cloned().collect()
    }

    #[test]
    fn title_resets_score_and_hides_restart() {
        let mut app = title_app();
        app.world_mut().resource_mut::<Score>().0 = 300;
        app.world_mut().send_event(SceneStarted {
            id: SceneId::Title,
            generation: 1,
        });

        app.update();

        assert_eq!(app.world().resource::<Score>().0, 0);
        assert_eq!(sent::<UiSignal>(&app), vec![UiSignal::HideRestart]);
    }

    #[test]
    fn enter_starts_the_club_only_on_the_title() {
        let mut app = title_app();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Enter);
        app.update();
        assert!(sent::<RestartRequest>(&app).is_empty());

        app.world_mut()
            .resource_mut::<SceneRegistry>()
            .start(SceneId::Title);
        {
            let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keyboard.release(KeyCode::Enter);
            keyboard.clear();
            keyboard.press(KeyCode::Enter);
        }
        app.update();
        assert_eq!(
            sent::<RestartRequest>(&app),
            vec![RestartRequest(SceneId::Club)]
        );
    }
}
