//! Prefab identity registry
//!
//! Two tables with very different lifetimes. Templates are registered
//! once per distinct prefab asset under a stable hash that becomes the
//! cross-session half of an instance's identity. Instances are tracked
//! per session only: the table must be cleared on every scene transition
//! because live ids mean nothing across one.

use crate::error::SaveError;
use crate::saver::SaverConfig;
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;
use relic_scene::{ObjectId, Scene, Template};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Length of generated hashes, in lowercase hex characters
const HASH_LEN: usize = 16;

/// Generate an identifier that is guaranteed absent from `is_taken`.
///
/// SHA-256 of the seed concatenated with a decimal salt counter,
/// truncated to 16 lowercase hex characters; the salt increments until
/// the digest clears the collision check.
pub fn generate_hash(seed: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let mut salt = 0u64;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(salt.to_string().as_bytes());
        let digest = hasher.finalize();
        let hash = hex::encode(&digest[..HASH_LEN / 2]);
        if !is_taken(&hash) {
            return hash;
        }
        salt += 1;
    }
}

/// Template and instance identity tables
#[derive(Debug, Default)]
pub struct PrefabRegistry {
    /// Stable hash -> template, registered once per prefab asset
    templates: HashMap<String, Template>,
    /// Instance hash -> live object, valid for this session only
    instances: HashMap<String, ObjectId>,
}

impl PrefabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, minting a stable hash from its name.
    /// Returns the hash the save stream will refer to it by.
    pub fn register(&mut self, template: Template) -> String {
        let hash = generate_hash(template.name(), |h| self.templates.contains_key(h));
        debug!("registered prefab template '{}' as {hash}", template.name());
        self.templates.insert(hash.clone(), template);
        hash
    }

    /// Register a template under a known hash (e.g. one recorded in
    /// existing save data). The hash must be free.
    pub fn register_with_hash(
        &mut self,
        template: Template,
        hash: impl Into<String>,
    ) -> Result<String, SaveError> {
        let hash = hash.into();
        if self.templates.contains_key(&hash) {
            return Err(SaveError::DuplicateHash(hash));
        }
        self.templates.insert(hash.clone(), template);
        Ok(hash)
    }

    /// Resolve a template hash; absence is fatal for a load
    pub fn template(&self, hash: &str) -> Result<&Template, SaveError> {
        self.templates
            .get(hash)
            .ok_or_else(|| SaveError::PrefabNotRegistered(hash.to_string()))
    }

    pub fn contains_template(&self, hash: &str) -> bool {
        self.templates.contains_key(hash)
    }

    /// Live instance tracked under an instance hash, if any
    pub fn instance(&self, instance_hash: &str) -> Option<ObjectId> {
        self.instances.get(instance_hash).copied()
    }

    /// All tracked instances of this session
    pub fn tracked_instances(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.instances.iter().map(|(h, id)| (h.as_str(), *id))
    }

    /// Track a live instance under its hash
    pub fn track_instance(&mut self, instance_hash: impl Into<String>, id: ObjectId) {
        self.instances.insert(instance_hash.into(), id);
    }

    /// Drop all instance tracking. Must be called on scene transitions:
    /// the ids are stale and cannot be matched against any stream.
    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }

    /// Mint an instance hash unique among currently tracked instances,
    /// seeded from a fresh random token
    pub fn mint_instance_hash(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        generate_hash(&token, |h| self.instances.contains_key(h))
    }

    /// Spawn a live instance of a registered template under `parent`,
    /// as gameplay code would: mints an instance hash, stamps the
    /// instance's saver identity and tracks it.
    pub fn spawn_instance(
        &mut self,
        scene: &mut Scene,
        prefab_hash: &str,
        parent: Option<ObjectId>,
    ) -> Result<ObjectId, SaveError> {
        let instance_hash = self.mint_instance_hash();
        self.materialize(scene, &instance_hash, prefab_hash, parent)
    }

    /// Return the instance already tracked under `instance_hash`, or
    /// materialize a fresh copy of the template under `parent` and track
    /// it. Fatal when the template hash is unknown.
    pub fn resolve_or_create_instance(
        &mut self,
        scene: &mut Scene,
        instance_hash: &str,
        prefab_hash: &str,
        parent: Option<ObjectId>,
    ) -> Result<ObjectId, SaveError> {
        if let Some(id) = self.instance(instance_hash) {
            if scene.is_alive(id) {
                return Ok(id);
            }
        }
        self.materialize(scene, instance_hash, prefab_hash, parent)
    }

    fn materialize(
        &mut self,
        scene: &mut Scene,
        instance_hash: &str,
        prefab_hash: &str,
        parent: Option<ObjectId>,
    ) -> Result<ObjectId, SaveError> {
        let template = self.template(prefab_hash)?;
        let id = template.instantiate(scene, parent);

        // stamp the instance's identity on its saver config
        if scene.component::<SaverConfig>(id).is_none() {
            scene.add_component(id, SaverConfig::default());
        }
        if let Some(cfg) = scene.component_mut::<SaverConfig>(id) {
            cfg.is_prefab = true;
            cfg.prefab_hash = Some(prefab_hash.to_string());
            cfg.instance_hash = Some(instance_hash.to_string());
        }

        self.instances.insert(instance_hash.to_string(), id);
        Ok(id)
    }
}
