//! Headless authoritative session.
//!
//! Loads content, spawns a hero and two dummies, drives a scripted input
//! sequence through the router and publishes the resulting replicated
//! changes to an in-process observer.
mod config;
mod scene;

use action_content::ContentFactory;
use action_core::{
    AttributeKind, AttributeStore, DefinitionCatalog, EntityId, Env, InputAction, InputEvent,
    ItemOracle, LoopbackBoundary, NetRole, ObserverMirror, Position, World, WorldStimulus,
};
use anyhow::{Context, Result};
use config::SandboxConfig;
use scene::{LogDraw, Scene};
use tracing::{info, warn};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SandboxConfig::from_env();
    let factory = ContentFactory::new(&config.content_dir);
    let catalog = factory
        .load_catalog()
        .with_context(|| format!("loading content from {}", config.content_dir.display()))?;
    let core = config.apply(factory.load_config()?);
    info!(debug_radial_damage = core.debug_radial_damage, "content loaded");

    let mut world = World::new(core);
    run_session(&mut world, &catalog)
}

fn spawn(
    world: &mut World,
    catalog: &DefinitionCatalog,
    name: &str,
    location: Position,
) -> Result<EntityId> {
    let definition = catalog
        .character(name)
        .with_context(|| format!("character '{name}' is not defined"))?;
    let attributes = AttributeStore::new()
        .with_base(AttributeKind::MaxHealth, 100.0)
        .with_base(AttributeKind::Health, 100.0)
        .with_base(AttributeKind::MaxStamina, 100.0)
        .with_base(AttributeKind::Stamina, 100.0)
        .with_base(AttributeKind::MaxMovementSpeed, 600.0);
    Ok(world.spawn_character(
        NetRole::Authority,
        definition,
        attributes,
        location,
        &Env::from_catalog(catalog),
    ))
}

fn press(world: &mut World, entity: EntityId, action: InputAction, env: Env<'_>) -> Result<()> {
    let outcome = world.dispatch_input(entity, &InputEvent::started(action), env)?;
    info!(%entity, %action, route = ?outcome.route, activated = outcome.activated, "pressed");
    Ok(())
}

fn release(world: &mut World, entity: EntityId, action: InputAction, env: Env<'_>) -> Result<()> {
    let outcome = world.dispatch_input(entity, &InputEvent::completed(action), env)?;
    info!(%entity, %action, cancelled = outcome.cancelled, "released");
    Ok(())
}

fn log_vitals(world: &World, entity: EntityId) {
    let Some(character) = world.character(entity) else {
        warn!(%entity, "no such character");
        return;
    };
    let attributes = character.abilities.attributes();
    info!(
        %entity,
        name = %character.name(),
        health = attributes.current(AttributeKind::Health),
        speed = character.movement_speed(),
        crouching = character.is_crouching(),
        equipped = ?character.inventory.equipped().map(|item| item.definition_id().clone()),
        "vitals"
    );
}

fn run_session(world: &mut World, catalog: &DefinitionCatalog) -> Result<()> {
    let env = Env::from_catalog(catalog);

    let hero = spawn(world, catalog, "Hero", Position::ZERO)?;
    let near = spawn(world, catalog, "Dummy", Position::new(150.0, 0.0, 0.0))?;
    let behind_cover = spawn(world, catalog, "Dummy", Position::new(0.0, 250.0, 0.0))?;
    for item in ["Rifle", "Pistol", "Medkit"] {
        world.grant_item(hero, &item.into(), env)?;
    }
    log_vitals(world, hero);

    // Crouch: the ability input comes first, the movement callback after.
    press(world, hero, InputAction::Crouch, env)?;
    world.dispatch_world(hero, WorldStimulus::CrouchStarted, &env)?;
    log_vitals(world, hero);
    release(world, hero, InputAction::Crouch, env)?;
    world.dispatch_world(hero, WorldStimulus::CrouchEnded, &env)?;

    press(world, hero, InputAction::Sprint, env)?;
    log_vitals(world, hero);
    release(world, hero, InputAction::Sprint, env)?;

    press(world, hero, InputAction::Jump, env)?;
    world.dispatch_world(hero, WorldStimulus::Jumped, &env)?;
    world.dispatch_world(hero, WorldStimulus::Landed, &env)?;

    press(world, hero, InputAction::EquipNext, env)?;
    press(world, hero, InputAction::Aim, env)?;
    log_vitals(world, hero);
    press(world, hero, InputAction::Attack, env)?;
    release(world, hero, InputAction::Attack, env)?;
    release(world, hero, InputAction::Aim, env)?;

    press(world, hero, InputAction::EquipNext, env)?;
    press(world, hero, InputAction::DropItem, env)?;
    let pickup = world.actors().pickups().next().map(|actor| actor.id);
    if let Some(pickup) = pickup {
        let item = world.pick_up(near, pickup, env)?;
        info!(entity = %near, %item, "picked up dropped item");
    }

    let rocket = catalog
        .projectile("Rocket")
        .context("projectile 'Rocket' is not defined")?;
    let scene = Scene::from_world(world).with_blocker(Position::new(37.5, 125.0, 0.0), 30.0);
    let mut draw = LogDraw::default();
    let report = world.projectile_impact(
        &rocket,
        Some(hero),
        Position::new(75.0, 0.0, 0.0),
        &env,
        &scene,
        &mut draw,
    );
    info!(
        candidates = report.candidates,
        damaged = report.damaged.len(),
        occluded = report.occluded.len(),
        shapes = draw.shapes,
        "rocket impact"
    );
    for entity in [near, behind_cover] {
        log_vitals(world, entity);
    }

    for step in 0..5 {
        let report = world.tick();
        info!(
            step,
            expired = report.expired,
            attribute_changes = report.attribute_changes.len(),
            remote_requests = report.remote_requests.len(),
            "tick"
        );
    }

    let mut boundary = LoopbackBoundary::new(ObserverMirror::new(Some(catalog as &dyn ItemOracle)));
    let published = world.publish(&mut boundary);
    let mirror = boundary.observer();
    for entity in [hero, near, behind_cover] {
        if let Some(view) = mirror.entity(entity) {
            info!(
                %entity,
                items = view.inventory.len(),
                equipped = ?mirror.equipped_visual(entity),
                profile = ?mirror.animation_profile(entity),
                "observer view"
            );
        }
    }
    info!(published, "session published");

    if let Some(items) = world.destroy_character(behind_cover, env) {
        info!(entity = %behind_cover, items = items.len(), "dummy removed");
    }
    Ok(())
}
