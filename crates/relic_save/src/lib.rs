//! # relic_save - Scene Save/Restore Protocol
//!
//! Persists a live scene graph to a single binary stream and
//! reconstructs object identity on load:
//!
//! - [`codec`] - fixed little-endian encoding for numeric aggregates,
//!   arrays and boxed member values
//! - [`member`] - tolerant name-based component member capture/apply
//! - [`material`] - shader property persistence
//! - [`prefab`] - template and instance identity tables with
//!   collision-avoiding hash generation
//! - [`saver`] - per-object persistence configuration
//! - [`record`] - the flag-gated object record layout
//! - [`manager`] - the save pass and the (possibly deferred) load replay
//!
//! Static objects are linked by session-local ids that are only ever
//! meaningful for parent resolution within one session; prefab instances
//! carry a stable template hash plus a session-unique instance hash, the
//! pair that lets a load materialize missing instances and attach both
//! ends of a parent link correctly.
//!
//! # Example
//!
//! ```ignore
//! use relic_save::prelude::*;
//! use relic_scene::prelude::*;
//!
//! let mut manager = SaveGameManager::new("saved");
//! let mut prefabs = PrefabRegistry::new();
//!
//! manager.save_game(&mut scene, "slot1")?;
//! match manager.load_game(&mut scene, &mut prefabs, "slot1")? {
//!     LoadOutcome::Completed => {}
//!     LoadOutcome::Deferred(pending) => {
//!         let mut scene = host_switch_scene(pending.target_scene());
//!         manager.resume_load(pending, &mut scene, &mut prefabs)?;
//!     }
//! }
//! ```

pub mod codec;
pub mod error;
pub mod manager;
pub mod material;
pub mod member;
pub mod prefab;
pub mod record;
pub mod saver;

pub mod prelude {
    pub use crate::codec::{from_value, to_value, ByteReader, ByteWriter};
    pub use crate::error::SaveError;
    pub use crate::manager::{LoadOutcome, PendingLoad, SaveGameManager};
    pub use crate::material::{MaterialProperty, PropertyKind};
    pub use crate::member::SavedMember;
    pub use crate::prefab::{generate_hash, PrefabRegistry};
    pub use crate::saver::SaverConfig;
}

pub use prelude::*;
