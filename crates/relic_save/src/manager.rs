//! Save/restore protocol
//!
//! Stream framing is `[scene name][u32 record count][record]*`. On save,
//! objects are emitted ancestors-first so a load can always attach a
//! child to an already materialized parent. On load, each record is
//! decoded completely and then applied; resolution failures inside a
//! record are isolated warnings, while an unresolvable prefab template
//! aborts the whole operation.
//!
//! A load whose stream targets another scene does not touch the current
//! one. It returns [`LoadOutcome::Deferred`] carrying a [`PendingLoad`];
//! the host switches scenes and hands the pending load back through
//! [`SaveGameManager::resume_load`] once the target scene is active. The
//! stream is then re-read from the start - no partial replay is resumed.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::SaveError;
use crate::material;
use crate::member;
use crate::prefab::PrefabRegistry;
use crate::record::{
    IdentityRef, ObjectRecord, ParentRef, PhysicsBlock, RenderBlock, TransformBlock,
};
use crate::saver::SaverConfig;
use log::{debug, info, warn};
use relic_scene::{MeshRenderer, ObjectId, RigidBody, Scene};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a load request
#[derive(Debug)]
pub enum LoadOutcome {
    /// The stream was replayed into the active scene
    Completed,
    /// The stream targets another scene; switch to it, then resume
    Deferred(PendingLoad),
}

/// A load waiting for its target scene to become active.
///
/// The only state carried across the suspension is the save name and the
/// scene it targets; resuming re-reads the whole stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingLoad {
    save_name: String,
    target_scene: String,
}

impl PendingLoad {
    pub fn save_name(&self) -> &str {
        &self.save_name
    }

    /// The scene the host must activate before resuming
    pub fn target_scene(&self) -> &str {
        &self.target_scene
    }
}

type EventHandler = Box<dyn FnMut(&str) + Send>;

/// Entry point for saving and loading scenes
pub struct SaveGameManager {
    save_dir: PathBuf,
    on_saved: Vec<EventHandler>,
    on_loaded: Vec<EventHandler>,
}

impl SaveGameManager {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            on_saved: Vec::new(),
            on_loaded: Vec::new(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Change the on-disk save directory. A path that exists as a
    /// regular file is rejected before any save/load is attempted.
    pub fn set_save_dir(&mut self, path: impl Into<PathBuf>) -> Result<(), SaveError> {
        let path = path.into();
        if path.is_file() {
            return Err(SaveError::PathIsFile(path));
        }
        self.save_dir = path;
        Ok(())
    }

    /// Register a callback fired after every completed save
    pub fn on_saved(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.on_saved.push(Box::new(handler));
    }

    /// Register a callback fired after every completed load
    pub fn on_loaded(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.on_loaded.push(Box::new(handler));
    }

    /// Path a save name maps to
    pub fn save_path(&self, save_name: &str) -> PathBuf {
        self.save_dir.join(save_name)
    }

    pub fn exists(&self, save_name: &str) -> bool {
        self.save_path(save_name).exists()
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Save every saveable object of the scene under `save_name`
    pub fn save_game(&mut self, scene: &mut Scene, save_name: &str) -> Result<(), SaveError> {
        fs::create_dir_all(&self.save_dir)?;
        let bytes = self.write_stream(scene)?;
        fs::write(self.save_path(save_name), bytes)?;
        info!("saved '{save_name}' from scene '{}'", scene.name());
        for handler in &mut self.on_saved {
            handler(save_name);
        }
        Ok(())
    }

    /// Serialize the scene to a save stream without touching the
    /// filesystem. Two calls on an unmodified scene produce identical
    /// bytes: the pass-scoped `saved` flags are fully reset on return.
    pub fn write_stream(&self, scene: &mut Scene) -> Result<Vec<u8>, SaveError> {
        let mut w = ByteWriter::new();
        w.write_str(scene.name());

        let savers: Vec<ObjectId> = scene
            .iter()
            .filter(|id| scene.component::<SaverConfig>(*id).is_some())
            .collect();
        w.write_u32(savers.len() as u32);

        for id in &savers {
            self.emit_object(scene, *id, &mut w);
        }
        for id in &savers {
            if let Some(cfg) = scene.component_mut::<SaverConfig>(*id) {
                cfg.saved = false;
            }
        }
        Ok(w.into_bytes())
    }

    /// Write one object's record, ancestors first. The `saved` flag
    /// guards against duplicate emission within the pass.
    fn emit_object(&self, scene: &mut Scene, id: ObjectId, w: &mut ByteWriter) {
        let Some(cfg) = scene.component::<SaverConfig>(id) else {
            return;
        };
        if cfg.saved {
            return;
        }
        let enabled = cfg.enabled;

        if enabled {
            // every enabled-but-unsaved ancestor carrying saveable state
            // must precede this record in the stream
            let mut ancestor = scene.parent(id);
            while let Some(a) = ancestor {
                let pending = scene
                    .component::<SaverConfig>(a)
                    .map(|c| c.enabled && !c.saved)
                    .unwrap_or(false);
                if pending {
                    self.emit_object(scene, a, w);
                }
                ancestor = scene.parent(a);
            }
        }

        let record = match scene.component::<SaverConfig>(id) {
            Some(cfg) if enabled => build_record(scene, id, cfg),
            _ => ObjectRecord::disabled(),
        };
        record.encode(w);

        if let Some(cfg) = scene.component_mut::<SaverConfig>(id) {
            cfg.saved = true;
        }
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    /// Load a save into the scene. When the stream targets a different
    /// scene the call defers instead: switch scenes and pass the
    /// returned [`PendingLoad`] to [`Self::resume_load`].
    pub fn load_game(
        &mut self,
        scene: &mut Scene,
        prefabs: &mut PrefabRegistry,
        save_name: &str,
    ) -> Result<LoadOutcome, SaveError> {
        let path = self.save_path(save_name);
        if !path.exists() {
            return Err(SaveError::SaveNotFound(save_name.to_string()));
        }
        let bytes = fs::read(path)?;
        self.read_stream(scene, prefabs, save_name, &bytes)
    }

    /// Re-enter a deferred load once its target scene is active. The
    /// stream is re-read from the start; if the active scene still does
    /// not match, the load defers again.
    pub fn resume_load(
        &mut self,
        pending: PendingLoad,
        scene: &mut Scene,
        prefabs: &mut PrefabRegistry,
    ) -> Result<LoadOutcome, SaveError> {
        debug!(
            "resuming deferred load '{}' in scene '{}'",
            pending.save_name,
            scene.name()
        );
        self.load_game(scene, prefabs, &pending.save_name)
    }

    /// Replay a save stream into the scene
    pub fn read_stream(
        &mut self,
        scene: &mut Scene,
        prefabs: &mut PrefabRegistry,
        save_name: &str,
        bytes: &[u8],
    ) -> Result<LoadOutcome, SaveError> {
        let mut r = ByteReader::new(bytes);
        let target_scene = r.read_str()?;

        if target_scene != scene.name() {
            info!(
                "save '{save_name}' targets scene '{target_scene}', deferring until it is active"
            );
            return Ok(LoadOutcome::Deferred(PendingLoad {
                save_name: save_name.to_string(),
                target_scene,
            }));
        }

        // stale instances from a previous session or scene cannot be
        // matched against this stream
        let stale: Vec<ObjectId> = prefabs.tracked_instances().map(|(_, id)| id).collect();
        for id in stale {
            scene.destroy(id);
        }
        prefabs.clear_instances();

        let count = r.read_u32()?;
        for _ in 0..count {
            let record = ObjectRecord::decode(&mut r)?;
            apply_record(scene, prefabs, &record)?;
        }

        info!("loaded '{save_name}' into scene '{}'", scene.name());
        for handler in &mut self.on_loaded {
            handler(save_name);
        }
        Ok(LoadOutcome::Completed)
    }
}

/// Apply one fully decoded record. Only an unresolvable prefab template
/// escalates; everything else degrades to warnings.
fn apply_record(
    scene: &mut Scene,
    prefabs: &mut PrefabRegistry,
    record: &ObjectRecord,
) -> Result<(), SaveError> {
    if !record.enabled {
        return Ok(());
    }

    let parent = match &record.parent {
        ParentRef::None => None,
        ParentRef::Instance(hash) => match prefabs.instance(hash) {
            Some(id) if scene.is_alive(id) => Some(id),
            _ => {
                warn!("parent instance {hash} is not tracked, attaching at root");
                None
            }
        },
        ParentRef::Object(bits) => {
            let id = ObjectId::from_bits(*bits);
            if scene.is_alive(id) {
                Some(id)
            } else {
                warn!("parent object {id} no longer exists, attaching at root");
                None
            }
        }
    };

    let id = match &record.identity {
        IdentityRef::Prefab {
            prefab_hash,
            instance_hash,
        } => prefabs.resolve_or_create_instance(scene, instance_hash, prefab_hash, parent)?,
        IdentityRef::Object(bits) => {
            let id = ObjectId::from_bits(*bits);
            if !scene.is_alive(id) {
                warn!("saved object {id} no longer exists, skipping record");
                return Ok(());
            }
            id
        }
    };

    if let Some(block) = &record.transform {
        apply_transform(scene, id, block);
    }
    if let Some(block) = &record.physics {
        apply_physics(scene, id, block);
    }
    if let Some(block) = &record.render {
        apply_render(scene, id, block);
    }
    if let Some(entries) = &record.members {
        for entry in entries {
            member::apply(scene, id, entry);
        }
    }
    Ok(())
}

/// Capture an enabled object's state into a record
fn build_record(scene: &Scene, id: ObjectId, cfg: &SaverConfig) -> ObjectRecord {
    let parent = match scene.parent(id) {
        None => ParentRef::None,
        Some(p) => match scene.component::<SaverConfig>(p) {
            Some(pc) if pc.is_prefab => match &pc.instance_hash {
                Some(hash) => ParentRef::Instance(hash.clone()),
                None => {
                    warn!("prefab parent {p} has no instance hash, linking by session id");
                    ParentRef::Object(p.to_bits())
                }
            },
            _ => ParentRef::Object(p.to_bits()),
        },
    };

    let identity = if cfg.is_prefab {
        match (&cfg.prefab_hash, &cfg.instance_hash) {
            (Some(prefab_hash), Some(instance_hash)) => IdentityRef::Prefab {
                prefab_hash: prefab_hash.clone(),
                instance_hash: instance_hash.clone(),
            },
            _ => {
                warn!("prefab object {id} is missing identity hashes, saving as static");
                IdentityRef::Object(id.to_bits())
            }
        }
    } else {
        IdentityRef::Object(id.to_bits())
    };

    let transform = cfg.save_transform.then(|| {
        let local = scene.transform(id).copied().unwrap_or_default();
        let (world_pos, world_rot, _) = scene
            .world_trs(id)
            .unwrap_or((local.position, local.rotation, local.scale));
        TransformBlock {
            use_local: cfg.use_local,
            position: cfg.save_position.then(|| {
                if cfg.use_local {
                    local.position
                } else {
                    world_pos
                }
            }),
            rotation: cfg.save_rotation.then(|| {
                if cfg.use_local {
                    local.rotation
                } else {
                    world_rot
                }
            }),
            scale: cfg.save_scale.then_some(local.scale),
        }
    });

    // the physics block is only written when a body actually exists
    let physics = match scene.component::<RigidBody>(id) {
        Some(body) if cfg.save_body => Some(PhysicsBlock {
            velocity: cfg.save_velocity.then_some(body.velocity),
            angular_velocity: cfg.save_angular_velocity.then_some(body.angular_velocity),
        }),
        _ => None,
    };

    let render = match scene.component::<MeshRenderer>(id) {
        Some(renderer) if cfg.save_renderer => Some(RenderBlock {
            color: cfg
                .save_color
                .then(|| renderer.primary().map(|m| m.color))
                .flatten(),
            texture: cfg
                .save_texture
                .then(|| renderer.primary().and_then(|m| m.texture.clone()))
                .flatten(),
            properties: cfg
                .properties
                .iter()
                .filter_map(|p| material::capture(scene, id, p))
                .collect(),
        }),
        _ => None,
    };

    let members = cfg.custom_members.then(|| {
        cfg.members
            .iter()
            .map(|m| member::capture(scene, id, m))
            .collect()
    });

    ObjectRecord {
        enabled: true,
        parent,
        identity,
        transform,
        physics,
        render,
        members,
    }
}

fn apply_transform(scene: &mut Scene, id: ObjectId, block: &TransformBlock) {
    if let Some(p) = block.position {
        if block.use_local {
            if let Some(t) = scene.transform_mut(id) {
                t.position = p;
            }
        } else {
            scene.set_world_position(id, p);
        }
    }
    if let Some(r) = block.rotation {
        if block.use_local {
            if let Some(t) = scene.transform_mut(id) {
                t.rotation = r;
            }
        } else {
            scene.set_world_rotation(id, r);
        }
    }
    if let Some(s) = block.scale {
        if let Some(t) = scene.transform_mut(id) {
            t.scale = s;
        }
    }
}

fn apply_physics(scene: &mut Scene, id: ObjectId, block: &PhysicsBlock) {
    // the block's presence means a body existed at save time
    if !scene.has_component::<RigidBody>(id) {
        scene.add_component(id, RigidBody::default());
    }
    let Some(body) = scene.component_mut::<RigidBody>(id) else {
        warn!("cannot restore rigid body state on {id}");
        return;
    };
    if let Some(v) = block.velocity {
        body.velocity = v;
    }
    if let Some(v) = block.angular_velocity {
        body.angular_velocity = v;
    }
}

fn apply_render(scene: &mut Scene, id: ObjectId, block: &RenderBlock) {
    if !scene.has_component::<MeshRenderer>(id) {
        scene.add_component(id, MeshRenderer::new());
    }
    if let Some(renderer) = scene.component_mut::<MeshRenderer>(id) {
        if let Some(material) = renderer.primary_mut() {
            if let Some(c) = block.color {
                material.color = c;
            }
            if let Some(t) = &block.texture {
                material.texture = Some(t.clone());
            }
        }
    }
    for prop in &block.properties {
        material::apply(scene, id, prop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    #[test]
    fn test_set_save_dir_rejects_file() {
        let dir = temp_dir().join("relic_test_dir_rejects");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("occupied");
        fs::write(&file, b"not a directory").unwrap();

        let mut manager = SaveGameManager::new(&dir);
        assert!(matches!(
            manager.set_save_dir(&file),
            Err(SaveError::PathIsFile(_))
        ));
        // the old directory remains configured
        assert_eq!(manager.save_dir(), dir.as_path());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_save() {
        let dir = temp_dir().join("relic_test_missing_save");
        let _ = fs::remove_dir_all(&dir);

        let mut manager = SaveGameManager::new(&dir);
        let mut scene = Scene::new("level1");
        let mut prefabs = PrefabRegistry::new();
        assert!(matches!(
            manager.load_game(&mut scene, &mut prefabs, "nope"),
            Err(SaveError::SaveNotFound(_))
        ));
    }

    #[test]
    fn test_save_creates_directory_and_file() {
        let dir = temp_dir().join("relic_test_save_creates");
        let _ = fs::remove_dir_all(&dir);

        let mut manager = SaveGameManager::new(&dir);
        let mut scene = Scene::new("level1");
        let id = scene.spawn("obj");
        scene.add_component(id, SaverConfig::default());

        manager.save_game(&mut scene, "slot1").unwrap();
        assert!(manager.exists("slot1"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_disabled_object_contributes_single_flag() {
        let manager = SaveGameManager::new("unused");
        let mut scene = Scene::new("level1");
        let id = scene.spawn("obj");
        scene.add_component(id, SaverConfig::disabled());

        let bytes = manager.write_stream(&mut scene).unwrap();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_str().unwrap(), "level1");
        assert_eq!(r.read_u32().unwrap(), 1);
        assert!(!r.read_bool().unwrap());
        assert!(r.is_empty());
    }
}
