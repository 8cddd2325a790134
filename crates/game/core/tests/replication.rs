use action_core::{
    AnimationProfileRef, AttributeKind, AttributeStore, CharacterData, CharacterDefinition,
    DefinitionCatalog, EntityId, Env, InputAction, InputEvent, ItemDefId, ItemDefinition,
    ItemOracle, NetRole, ObserverMirror, Position, RecordingBoundary, ReplicatedFields, World,
};

fn catalog() -> DefinitionCatalog {
    let mut catalog = DefinitionCatalog::new();
    let mut rifle = ItemDefinition::equippable("Rifle").with_socket("hand_r");
    rifle.animation_profile = Some(AnimationProfileRef::new("Rifle"));
    catalog.insert_item(rifle);
    catalog.insert_item(ItemDefinition::equippable("Pistol"));
    catalog.insert_character(CharacterDefinition {
        name: "Hero".into(),
        data: CharacterData::new().with_animation_profile(AnimationProfileRef::new("Unarmed")),
        ..CharacterDefinition::default()
    });
    catalog
}

fn spawn(world: &mut World, catalog: &DefinitionCatalog, role: NetRole) -> EntityId {
    world.spawn_character(
        role,
        catalog.character("Hero").expect("hero definition"),
        AttributeStore::new().with_base(AttributeKind::MaxMovementSpeed, 500.0),
        Position::ZERO,
        &Env::from_catalog(catalog),
    )
}

/// Observer input travels to the authority as a request; the authority's
/// replicated changes drive the observer's presentation.
///
/// 1. Observer presses EquipNext: nothing changes locally, a request is queued
/// 2. Authority executes the forwarded request and equips the Rifle
/// 3. Published changes re-derive the observer's visual and animation profile
#[test]
fn observer_request_round_trip() {
    let catalog = catalog();
    let env = Env::from_catalog(&catalog);

    let mut authority = World::default();
    let hero = spawn(&mut authority, &catalog, NetRole::Authority);
    authority
        .grant_item(hero, &"Rifle".into(), env)
        .expect("rifle granted");
    authority
        .grant_item(hero, &"Pistol".into(), env)
        .expect("pistol granted");

    let mut remote = World::default();
    let replica = spawn(&mut remote, &catalog, NetRole::Observer);
    assert_eq!(replica, hero);
    assert!(remote.outbox().is_empty());

    // ========================================================================
    // Observer side
    // ========================================================================
    let outcome = remote
        .dispatch_input(replica, &InputEvent::started(InputAction::EquipNext), env)
        .expect("replica exists");
    assert!(!outcome.inventory_handled);
    let requests = remote
        .character_mut(replica)
        .expect("replica")
        .abilities
        .take_remote_requests();
    assert_eq!(requests.len(), 1);
    assert!(remote.actors().is_empty());

    // ========================================================================
    // Authority side
    // ========================================================================
    let handled = authority
        .apply_remote_requests(hero, requests, env)
        .expect("hero exists");
    assert_eq!(handled, 1);
    let equipped = authority
        .character(hero)
        .and_then(|character| character.inventory.equipped())
        .expect("rifle equipped");
    assert_eq!(equipped.definition_id(), &ItemDefId::new("Rifle"));

    let mut boundary = RecordingBoundary::default();
    authority.publish(&mut boundary);
    let dirty = boundary
        .published
        .iter()
        .fold(ReplicatedFields::empty(), |fields, change| fields | change.field());
    assert!(dirty.contains(ReplicatedFields::CHARACTER_DATA | ReplicatedFields::ITEM_EQUIPPED));

    // ========================================================================
    // Presentation
    // ========================================================================
    let mut mirror = ObserverMirror::new(Some(&catalog as &dyn ItemOracle));
    for change in &boundary.published {
        change.deliver_to(&mut mirror);
    }
    assert_eq!(mirror.equipped_visual(hero), Some(&ItemDefId::new("Rifle")));
    assert_eq!(
        mirror.animation_profile(hero),
        Some(&AnimationProfileRef::new("Rifle"))
    );

    let view = mirror.entity(hero).expect("presentation");
    assert_eq!(view.inventory.len(), 2);
    assert_eq!(view.equipped_count(), 1);
}

/// Fields of a swap may arrive in any cross-field order; presentation settles
/// on the same result.
#[test]
fn swapped_field_arrival_converges() {
    let catalog = catalog();
    let env = Env::from_catalog(&catalog);
    let mut authority = World::default();
    let hero = spawn(&mut authority, &catalog, NetRole::Authority);
    for item in ["Rifle", "Pistol"] {
        authority
            .grant_item(hero, &item.into(), env)
            .expect("item granted");
    }
    for _ in 0..2 {
        authority
            .dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env)
            .expect("hero exists");
    }

    let mut boundary = RecordingBoundary::default();
    authority.publish(&mut boundary);
    let changes = boundary.published;

    let in_order = {
        let mut mirror = ObserverMirror::new(Some(&catalog as &dyn ItemOracle));
        for change in &changes {
            change.deliver_to(&mut mirror);
        }
        mirror.entity(hero).cloned().expect("presentation")
    };

    // Deliver item fields per field in order, but all non-equip fields first.
    let mut mirror = ObserverMirror::new(Some(&catalog as &dyn ItemOracle));
    let (equips, others): (Vec<_>, Vec<_>) = changes
        .iter()
        .partition(|change| change.field() == ReplicatedFields::ITEM_EQUIPPED);
    for change in others.into_iter().chain(equips) {
        change.deliver_to(&mut mirror);
    }
    let reordered = mirror.entity(hero).cloned().expect("presentation");

    assert_eq!(in_order.equipped_visual, reordered.equipped_visual);
    assert_eq!(in_order.animation_profile, reordered.animation_profile);
    assert_eq!(
        reordered.equipped_visual.map(|(_, definition)| definition),
        Some(ItemDefId::new("Pistol"))
    );
    assert_eq!(reordered.animation_profile, Some(AnimationProfileRef::new("Unarmed")));
}
