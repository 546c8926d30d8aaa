//! Follow camera. Eases toward the player and never shows anything outside `WorldBounds`; a
//! level narrower than the view is centered instead.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::physics::WorldBounds;
use crate::player::Player;
use crate::state::GameSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (snap_to_new_player, follow_player_camera)
                .chain()
                .after(GameSet::Physics)
                .run_if(has_player_and_camera),
        );
    }
}

/// Fraction of the remaining distance covered per frame at 60 fps.
const FOLLOW_LERP: f32 = 0.1;

#[derive(Component)]
pub struct FollowCamera;

fn has_player_and_camera(
    player_query: Query<Entity, With<Player>>,
    camera_query: Query<Entity, With<FollowCamera>>,
) -> bool {
    !player_query.is_empty() && !camera_query.is_empty()
}

/// Camera center that keeps a view of `half_view` inside `bounds` while staying as close to
/// `target` as possible.
pub fn clamp_to_bounds(target: Vec2, half_view: Vec2, bounds: &WorldBounds) -> Vec2 {
    Vec2::new(
        clamp_axis(target.x, half_view.x, bounds.min.x, bounds.max.x),
        clamp_axis(target.y, half_view.y, bounds.min.y, bounds.max.y),
    )
}

fn clamp_axis(target: f32, half: f32, min: f32, max: f32) -> f32 {
    if max - min <= half * 2.0 {
        (min + max) * 0.5
    } else {
        target.clamp(min + half, max - half)
    }
}

fn half_view(window: Option<&Window>, projection: &OrthographicProjection) -> Vec2 {
    window.map_or(Vec2::ZERO, |w| {
        Vec2::new(w.resolution.width(), w.resolution.height()) * 0.5 * projection.scale
    })
}

/// A freshly spawned player gets the camera immediately instead of a pan across the level.
fn snap_to_new_player(
    mut cameras: Query<(&mut Transform, &OrthographicProjection), With<FollowCamera>>,
    players: Query<&Transform, (Added<Player>, Without<FollowCamera>)>,
    window: Query<&Window, With<PrimaryWindow>>,
    bounds: Res<WorldBounds>,
) {
    let Ok(player) = players.get_single() else {
        return;
    };
    let Ok((mut camera, projection)) = cameras.get_single_mut() else {
        return;
    };

    let half = half_view(window.get_single().ok(), projection);
    let target = clamp_to_bounds(player.translation.truncate(), half, &bounds);
    camera.translation = target.extend(camera.translation.z);
}

fn follow_player_camera(
    mut cameras: Query<(&mut Transform, &OrthographicProjection), With<FollowCamera>>,
    players: Query<&Transform, (With<Player>, Without<FollowCamera>)>,
    window: Query<&Window, With<PrimaryWindow>>,
    bounds: Res<WorldBounds>,
    time: Res<Time>,
) {
    let Ok(player) = players.get_single() else {
        return;
    };
    let Ok((mut camera, projection)) = cameras.get_single_mut() else {
        return;
    };

    let half = half_view(window.get_single().ok(), projection);
    let desired = clamp_to_bounds(player.translation.truncate(), half, &bounds);

    let t = 1.0 - (1.0 - FOLLOW_LERP).powf(time.delta_seconds() * 60.0);
    let current = camera.translation.truncate();
    camera.translation = current.lerp(desired, t).extend(camera.translation.z);
}
