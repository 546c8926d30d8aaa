//! Arcade-style body integration: gravity, axis-separated movement against static solids, and
//! per-frame blocked flags. Only dynamic bodies move; platforms are `Solid` and never do.
//!
//! Overlap between two dynamic bodies (player vs enemy, player vs pickup) is never resolved
//! here. Those are queried with `Aabb::intersects` by the systems that care.

use bevy::prelude::*;

use crate::config::GameConfig;
use crate::state::{GameSet, GameState};

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldBounds>().add_systems(
            Update,
            integrate_bodies
                .in_set(GameSet::Physics)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

#[derive(Component, Default, Deref, DerefMut, Debug, Clone, Copy)]
pub struct Velocity(pub Vec2);

/// Downward acceleration applied to this body only.
#[derive(Component, Debug, Clone, Copy)]
pub struct Gravity(pub f32);

#[derive(Component, Copy, Clone, Debug)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }

    pub fn aabb(&self, center: Vec2) -> Aabb {
        Aabb::from_center(center, self.half_extents)
    }
}

/// Static, immovable collision geometry.
#[derive(Component)]
pub struct Solid;

/// Which sides of the body were blocked during the last integration step.
#[derive(Component, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contacts {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

impl Contacts {
    pub fn grounded(&self) -> bool {
        self.down
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn top(&self) -> f32 {
        self.max.y
    }

    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap; boxes that merely share an edge do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Playable area of the current level. Bodies are kept inside it.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(960.0, 540.0),
        }
    }
}

const SKIN: f32 = 0.001;

fn integrate_bodies(
    time: Res<Time>,
    config: Res<GameConfig>,
    bounds: Res<WorldBounds>,
    solids: Query<(&Transform, &Collider), (With<Solid>, Without<Velocity>)>,
    mut bodies: Query<(
        &mut Transform,
        &mut Velocity,
        &mut Contacts,
        &Collider,
        Option<&Gravity>,
    )>,
) {
    let dt = time.delta_seconds();
    if dt <= 0.0 {
        return;
    }

    let solid_boxes: Vec<Aabb> = solids
        .iter()
        .map(|(transform, collider)| collider.aabb(transform.translation.truncate()))
        .collect();

    for (mut transform, mut velocity, mut contacts, collider, gravity) in &mut bodies {
        let outcome = step_body(
            transform.translation.truncate(),
            velocity.0,
            collider.half_extents,
            gravity.map_or(0.0, |g| g.0),
            config.physics.terminal_velocity,
            dt,
            &solid_boxes,
            &bounds,
        );

        transform.translation.x = outcome.position.x;
        transform.translation.y = outcome.position.y;
        velocity.0 = outcome.velocity;
        *contacts = outcome.contacts;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub position: Vec2,
    pub velocity: Vec2,
    pub contacts: Contacts,
}

/// Advances one body by `dt`. X is resolved before Y so a body sliding along a floor never
/// snags on the seam between two platforms.
#[allow(clippy::too_many_arguments)]
pub fn step_body(
    position: Vec2,
    velocity: Vec2,
    half: Vec2,
    gravity: f32,
    terminal_velocity: f32,
    dt: f32,
    solids: &[Aabb],
    bounds: &WorldBounds,
) -> StepOutcome {
    let mut position = position;
    let mut velocity = velocity;
    let mut contacts = Contacts::default();

    velocity.y = (velocity.y - gravity * dt).max(-terminal_velocity);

    resolve_horizontal(&mut position, &mut velocity.x, half, dt, solids, &mut contacts);
    resolve_vertical(&mut position, &mut velocity.y, half, dt, solids, &mut contacts);
    clamp_to_bounds(&mut position, &mut velocity, half, bounds, &mut contacts);

    StepOutcome {
        position,
        velocity,
        contacts,
    }
}

fn resolve_horizontal(
    position: &mut Vec2,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    solids: &[Aabb],
    contacts: &mut Contacts,
) {
    if velocity.abs() < f32::EPSILON {
        return;
    }

    let new_x = position.x + *velocity * dt;
    let moved = Aabb::from_center(Vec2::new(new_x, position.y), half - Vec2::new(0.0, SKIN));

    let hit = solids.iter().filter(|solid| moved.intersects(solid));
    if *velocity > 0.0 {
        if let Some(wall) = hit.map(|s| s.min.x).reduce(f32::min) {
            position.x = wall - half.x - SKIN;
            *velocity = 0.0;
            contacts.right = true;
            return;
        }
    } else if let Some(wall) = hit.map(|s| s.max.x).reduce(f32::max) {
        position.x = wall + half.x + SKIN;
        *velocity = 0.0;
        contacts.left = true;
        return;
    }

    position.x = new_x;
}

fn resolve_vertical(
    position: &mut Vec2,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    solids: &[Aabb],
    contacts: &mut Contacts,
) {
    let new_y = position.y + *velocity * dt;
    let moved = Aabb::from_center(Vec2::new(position.x, new_y), half - Vec2::new(SKIN, 0.0));

    let hit = solids.iter().filter(|solid| moved.intersects(solid));
    if *velocity < 0.0 {
        if let Some(floor) = hit.map(|s| s.max.y).reduce(f32::max) {
            position.y = floor + half.y + SKIN;
            *velocity = 0.0;
            contacts.down = true;
            return;
        }
    } else if *velocity > 0.0 {
        if let Some(ceiling) = hit.map(|s| s.min.y).reduce(f32::min) {
            position.y = ceiling - half.y - SKIN;
            *velocity = 0.0;
            contacts.up = true;
            return;
        }
    }

    position.y = new_y;
}

fn clamp_to_bounds(
    position: &mut Vec2,
    velocity: &mut Vec2,
    half: Vec2,
    bounds: &WorldBounds,
    contacts: &mut Contacts,
) {
    if position.x - half.x < bounds.min.x {
        position.x = bounds.min.x + half.x;
        velocity.x = velocity.x.max(0.0);
        contacts.left = true;
    } else if position.x + half.x > bounds.max.x {
        position.x = bounds.max.x - half.x;
        velocity.x = velocity.x.min(0.0);
        contacts.right = true;
    }

    if position.y - half.y < bounds.min.y {
        position.y = bounds.min.y + half.y;
        velocity.y = velocity.y.max(0.0);
        contacts.down = true;
    } else if position.y + half.y > bounds.max.y {
        position.y = bounds.max.y - half.y;
        velocity.y = velocity.y.min(0.0);
        contacts.up = true;
    }
}
