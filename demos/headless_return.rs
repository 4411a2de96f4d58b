use avian3d::prelude::*;
use bevy::app::ScheduleRunnerPlugin;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_thrown_weapons::prelude::*;
use std::time::Duration;

fn main() {
    println!("Starting headless return simulation...");
    println!("A level 3 returning dagger is thrown at a wall 8 blocks away.");

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))))
        .add_plugins((AssetPlugin::default(), TransformPlugin, bevy::scene::ScenePlugin))
        .init_resource::<Assets<Mesh>>()
        .add_plugins(PhysicsPlugins::default())
        .add_plugins(ThrownWeaponsCorePlugin)
        .add_plugins(ThrownWeaponsObserverPlugin)
        .add_systems(Startup, setup_simulation)
        .add_systems(Update, (report_messages, stop_after_timeout))
        .add_systems(FixedUpdate, report_projectiles.after(ThrownWeaponSet::Replication))
        .run();
}

#[derive(Resource)]
struct Thrower(Entity);

fn setup_simulation(mut commands: Commands, mut requests: MessageWriter<ThrowRequest>) {
    println!("\n[SETUP] Spawning thrower and wall...");

    let dagger = WeaponInstance::new("iron_dagger").with_modifier(ModifierKind::Return, 3);
    let thrower = commands
        .spawn((
            Transform::default(),
            Agent::player(1),
            Holdings { items: vec![dagger] },
            Collider::capsule(0.3, 1.2),
            RigidBody::Kinematic,
            Name::new("Thrower"),
        ))
        .id();

    // Forward is -Z
    commands.spawn((
        Transform::from_xyz(0.0, 1.62, -8.0),
        WorldBlock::default(),
        Collider::cuboid(1.0, 1.0, 1.0),
        RigidBody::Static,
        Name::new("Wall"),
    ));

    commands.insert_resource(Thrower(thrower));
    requests.write(ThrowRequest::new(thrower, 0).with_charge(20).with_seed(7));
}

fn report_projectiles(query: Query<(&Transform, &ThrownWeapon), Changed<ThrownWeapon>>) {
    for (transform, projectile) in query.iter() {
        if projectile.age % 5 == 0 {
            println!(
                "[TICK {:>3}] {:?} at {:.2?}, speed {:.3}",
                projectile.age,
                projectile.state,
                transform.translation,
                projectile.velocity.length()
            );
        }
    }
}

fn report_messages(
    mut block_hits: MessageReader<BlockHitEvent>,
    mut removals: MessageReader<ProjectileRemoved>,
    thrower: Res<Thrower>,
    holdings: Query<&Holdings>,
) {
    for hit in block_hits.read() {
        println!("[IMPACT] Embedded at {:.2?}", hit.point);
    }
    for removal in removals.read() {
        let carried = holdings.get(thrower.0).map(|h| h.items.len()).unwrap_or(0);
        println!(
            "[REMOVED] {:?} at {:.2?}; thrower now carries {} item(s)",
            removal.reason, removal.position, carried
        );
        if removal.reason == RemovalReason::Retrieved {
            println!("[FINISHED] Dagger is back in hand.");
            std::process::exit(0);
        }
    }
}

fn stop_after_timeout(time: Res<Time>) {
    if time.elapsed_secs() > 10.0 {
        println!("[FINISHED] Timed out before the dagger came back.");
        std::process::exit(1);
    }
}
