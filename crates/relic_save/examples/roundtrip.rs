//! Minimal save/load round trip.
//!
//! Run with `RUST_LOG=debug cargo run --example roundtrip` to watch the
//! protocol log its decisions.

use relic_math::Vec3;
use relic_save::manager::{LoadOutcome, SaveGameManager};
use relic_save::prefab::PrefabRegistry;
use relic_save::saver::SaverConfig;
use relic_scene::{Scene, Template};

fn main() -> Result<(), relic_save::SaveError> {
    env_logger::init();

    let mut manager = SaveGameManager::new(std::env::temp_dir().join("relic_demo_saves"));
    let mut prefabs = PrefabRegistry::new();
    let barrel_hash = prefabs.register(Template::new("barrel", |scene, parent| {
        let id = match parent {
            Some(p) => scene.spawn_child("barrel", p),
            None => scene.spawn("barrel"),
        };
        scene.add_component(id, SaverConfig::default().with_local_space());
        id
    }));

    // a platform with a barrel on top
    let mut scene = Scene::new("level1");
    let platform = scene.spawn("platform");
    scene.add_component(platform, SaverConfig::default());
    scene.transform_mut(platform).unwrap().position = Vec3::new(1.0, 2.0, 3.0);
    let barrel = prefabs.spawn_instance(&mut scene, &barrel_hash, Some(platform))?;
    scene.transform_mut(barrel).unwrap().position = Vec3::new(0.0, 1.0, 0.0);

    manager.save_game(&mut scene, "demo")?;
    println!("saved scene '{}' with {} objects", scene.name(), scene.len());

    // simulate the next session: same scene layout, no barrel yet
    let mut scene = Scene::new("level1");
    let platform = scene.spawn("platform");
    scene.add_component(platform, SaverConfig::default());

    match manager.load_game(&mut scene, &mut prefabs, "demo")? {
        LoadOutcome::Completed => {}
        LoadOutcome::Deferred(pending) => {
            println!("unexpected deferral to '{}'", pending.target_scene());
            return Ok(());
        }
    }

    println!(
        "restored platform at {:?}, scene now has {} objects",
        scene.world_position(platform),
        scene.len()
    );
    Ok(())
}
