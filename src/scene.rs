//! Scene lifecycle and the restart controller.
//!
//! A scene is a named group of entities tagged `SceneMember(id)`. `SceneRegistry` tracks which
//! scenes are running and their draw order, and queues lifecycle operations; `apply_scene_ops`
//! carries them out by despawning members and announcing fresh starts with `SceneStarted`. The
//! builders in `level`, `title` and `ui` listen for that event and populate the scene.
//!
//! The UI overlay (`SceneId::Ui`) is launched once at boot and never stopped. Gameplay scenes are
//! mutually exclusive: every switch goes through `RestartController::restart_to`.

use bevy::prelude::*;

use crate::audio::AudioCue;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneRegistry>()
            .init_resource::<RestartController>()
            .add_event::<RestartRequest>()
            .add_event::<SceneStarted>()
            .add_event::<UiSignal>()
            .add_systems(Startup, boot_scenes)
            .add_systems(
                Update,
                (
                    (handle_restart_requests, apply_scene_ops)
                        .chain()
                        .in_set(SceneSet::Flow),
                    apply_ui_signals.in_set(SceneSet::Signals),
                ),
            );
    }
}

/// Scene bookkeeping runs in this order, independent of pause state.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneSet {
    /// Restart requests resolved, members despawned, starts announced.
    Flow,
    /// Builders react to `SceneStarted`.
    Build,
    /// `UiSignal`s from the builders reach the restart controller.
    Signals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneId {
    Title,
    Club,
    Foundry,
    /// Persistent overlay holding the restart button.
    Ui,
}

impl SceneId {
    pub const ALL: [SceneId; 4] = [SceneId::Title, SceneId::Club, SceneId::Foundry, SceneId::Ui];

    pub fn key(self) -> &'static str {
        match self {
            SceneId::Title => "title",
            SceneId::Club => "scene1_club",
            SceneId::Foundry => "scene2_foundry",
            SceneId::Ui => "ui",
        }
    }

    /// Scenes the player actually plays in; these show the restart button.
    pub fn is_gameplay(self) -> bool {
        matches!(self, SceneId::Club | SceneId::Foundry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStatus {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneRecord {
    pub id: SceneId,
    pub status: SceneStatus,
    /// Bumped on every start or restart.
    pub generation: u32,
}

impl SceneRecord {
    pub fn is_active(&self) -> bool {
        self.status == SceneStatus::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOp {
    Start,
    Stop,
    Restart,
}

/// What a scene manager has to offer the restart controller.
///
/// Only the enumerable `scenes()` collection is required for queries; `scene` and
/// `active_scenes` fall back to find/filter over it. Hosts with a direct lookup may override
/// them.
pub trait SceneHost {
    fn scenes(&self) -> &[SceneRecord];

    fn start(&mut self, id: SceneId);

    fn stop(&mut self, id: SceneId);

    fn restart(&mut self, id: SceneId);

    fn bring_to_top(&mut self, id: SceneId);

    fn scene(&self, id: SceneId) -> Option<&SceneRecord> {
        self.scenes().iter().find(|record| record.id == id)
    }

    fn active_scenes(&self) -> Vec<&SceneRecord> {
        self.scenes().iter().filter(|record| record.is_active()).collect()
    }
}

/// Running scenes, their draw order (last is on top), and operations not yet applied to the
/// world.
#[derive(Resource, Debug)]
pub struct SceneRegistry {
    records: Vec<SceneRecord>,
    draw_order: Vec<SceneId>,
    pending: Vec<(SceneId, SceneOp)>,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self {
            records: SceneId::ALL
                .iter()
                .map(|&id| SceneRecord {
                    id,
                    status: SceneStatus::Stopped,
                    generation: 0,
                })
                .collect(),
            draw_order: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl SceneRegistry {
    pub fn top(&self) -> Option<SceneId> {
        self.draw_order.last().copied()
    }

    /// Position in the draw order, 0 being the bottom. `None` when not running.
    pub fn layer_of(&self, id: SceneId) -> Option<usize> {
        self.draw_order.iter().position(|&s| s == id)
    }

    pub fn drain_ops(&mut self) -> Vec<(SceneId, SceneOp)> {
        std::mem::take(&mut self.pending)
    }

    fn record_mut(&mut self, id: SceneId) -> &mut SceneRecord {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .unwrap_or_else(|| {
                self.records.push(SceneRecord {
                    id,
                    status: SceneStatus::Stopped,
                    generation: 0,
                });
                self.records.len() - 1
            });
        &mut self.records[index]
    }

    fn raise(&mut self, id: SceneId) {
        self.draw_order.retain(|&s| s != id);
        self.draw_order.push(id);
    }
}

impl SceneHost for SceneRegistry {
    fn scenes(&self) -> &[SceneRecord] {
        &self.records
    }

    /// Starting a running scene restarts it.
    fn start(&mut self, id: SceneId) {
        let record = self.record_mut(id);
        if record.is_active() {
            self.restart(id);
            return;
        }
        record.status = SceneStatus::Running;
        record.generation += 1;
        self.raise(id);
        self.pending.push((id, SceneOp::Start));
    }

    fn stop(&mut self, id: SceneId) {
        let record = self.record_mut(id);
        if !record.is_active() {
            return;
        }
        record.status = SceneStatus::Stopped;
        self.draw_order.retain(|&s| s != id);
        self.pending.push((id, SceneOp::Stop));
    }

    fn restart(&mut self, id: SceneId) {
        let record = self.record_mut(id);
        if !record.is_active() {
            self.start(id);
            return;
        }
        record.generation += 1;
        self.pending.push((id, SceneOp::Restart));
    }

    fn bring_to_top(&mut self, id: SceneId) {
        if self.scene(id).is_some_and(SceneRecord::is_active) {
            self.raise(id);
        }
    }

    fn scene(&self, id: SceneId) -> Option<&SceneRecord> {
        self.records.iter().find(|record| record.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    RestartedInPlace,
    Switched,
    Ignored,
}

/// Owns the restart button's visibility and the rules for moving between scenes.
#[derive(Resource, Debug, Default)]
pub struct RestartController {
    restart_visible: bool,
}

impl RestartController {
    pub fn restart_visible(&self) -> bool {
        self.restart_visible
    }

    /// Makes `target` the single running gameplay scene, restarting it in place if it already
    /// is. The UI overlay is never stopped and is not a valid target.
    pub fn restart_to(&mut self, host: &mut impl SceneHost, target: SceneId) -> RestartOutcome {
        if target == SceneId::Ui {
            return RestartOutcome::Ignored;
        }

        let outcome = if host.scene(target).is_some_and(SceneRecord::is_active) {
            host.restart(target);
            RestartOutcome::RestartedInPlace
        } else {
            let running: Vec<SceneId> = host
                .active_scenes()
                .into_iter()
                .map(|record| record.id)
                .filter(|&id| id != SceneId::Ui)
                .collect();
            for id in running {
                host.stop(id);
            }
            host.start(target);
            RestartOutcome::Switched
        };

        if target.is_gameplay() {
            self.show_restart(host);
        } else {
            self.hide_restart();
        }
        outcome
    }

    pub fn show_restart(&mut self, host: &mut impl SceneHost) {
        self.restart_visible = true;
        host.bring_to_top(SceneId::Ui);
    }

    pub fn hide_restart(&mut self) {
        self.restart_visible = false;
    }
}

/// Tags an entity as content of a scene. Stopping or restarting the scene despawns it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneMember(pub SceneId);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiSignal {
    ShowRestart,
    HideRestart,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest(pub SceneId);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStarted {
    pub id: SceneId,
    pub generation: u32,
}

fn boot_scenes(
    mut registry: ResMut<SceneRegistry>,
    mut controller: ResMut<RestartController>,
    mut cues: EventWriter<AudioCue>,
) {
    registry.start(SceneId::Ui);
    controller.hide_restart();
    registry.start(SceneId::Title);
    cues.send(AudioCue::Coin);
    info!("Booted: ui overlay launched, heading to title");
}

fn handle_restart_requests(
    mut requests: EventReader<RestartRequest>,
    mut registry: ResMut<SceneRegistry>,
    mut controller: ResMut<RestartController>,
) {
    for RestartRequest(target) in requests.read() {
        let outcome = controller.restart_to(&mut *registry, *target);
        match outcome {
            RestartOutcome::Ignored => warn!("Ignoring restart request for {}", target.key()),
            _ => info!("Restart to {}: {:?}", target.key(), outcome),
        }
    }
}

fn apply_scene_ops(
    mut commands: Commands,
    mut registry: ResMut<SceneRegistry>,
    members: Query<(Entity, &SceneMember)>,
    mut started: EventWriter<SceneStarted>,
) {
    for (id, op) in registry.drain_ops() {
        if matches!(op, SceneOp::Stop | SceneOp::Restart) {
            let mut despawned = 0;
            for (entity, member) in &members {
                if member.0 == id {
                    commands.entity(entity).despawn_recursive();
                    despawned += 1;
                }
            }
            debug!("Tore down {} ({despawned} entities)", id.key());
        }

        if matches!(op, SceneOp::Start | SceneOp::Restart) {
            let generation = registry.scene(id).map_or(0, |record| record.generation);
            info!("Starting {} (generation {generation})", id.key());
            started.send(SceneStarted { id, generation });
        }
    }
}

fn apply_ui_signals(
    mut signals: EventReader<UiSignal>,
    mut registry: ResMut<SceneRegistry>,
    mut controller: ResMut<RestartController>,
) {
    for signal in signals.read() {
        match signal {
            UiSignal::ShowRestart => controller.show_restart(&mut *registry),
            UiSignal::HideRestart => controller.hide_restart(),
        }
    }
}
