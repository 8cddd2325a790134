//! Content factory for building definition catalogs from data files.

use std::path::{Path, PathBuf};

use action_core::{
    AbilityDefinition, CharacterDefinition, CoreConfig, DefinitionCatalog, EffectDefinition,
};
use tracing::debug;

use crate::loaders::{
    AbilityLoader, CharacterLoader, ConfigLoader, EffectLoader, ItemCatalog, ItemLoader,
    LoadResult,
};

/// Content factory that loads all definition data from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── effects.ron
/// ├── abilities.ron
/// ├── items.ron
/// └── characters.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load core configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CoreConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load effect definitions from `effects.ron`.
    pub fn load_effects(&self) -> LoadResult<Vec<EffectDefinition>> {
        let path = self.data_dir.join("effects.ron");
        EffectLoader::load(&path)
    }

    /// Load ability definitions from `abilities.ron`.
    pub fn load_abilities(&self) -> LoadResult<Vec<AbilityDefinition>> {
        let path = self.data_dir.join("abilities.ron");
        AbilityLoader::load(&path)
    }

    /// Load item and projectile definitions from `items.ron`.
    pub fn load_items(&self) -> LoadResult<ItemCatalog> {
        let path = self.data_dir.join("items.ron");
        ItemLoader::load(&path)
    }

    /// Load character archetypes from `characters.ron`.
    pub fn load_characters(&self) -> LoadResult<Vec<CharacterDefinition>> {
        let path = self.data_dir.join("characters.ron");
        CharacterLoader::load(&path)
    }

    /// Loads every catalog file into one [`DefinitionCatalog`].
    ///
    /// Fails if any definition refers to an effect, ability or item that is
    /// not defined, so broken content is caught at load time rather than as
    /// missing-definition no-ops during play.
    pub fn load_catalog(&self) -> LoadResult<DefinitionCatalog> {
        let mut catalog = DefinitionCatalog::new();

        for effect in self.load_effects()? {
            catalog.insert_effect(effect);
        }
        for ability in self.load_abilities()? {
            catalog.insert_ability(ability);
        }
        let items = self.load_items()?;
        for item in items.items {
            catalog.insert_item(item);
        }
        for (name, projectile) in items.projectiles {
            catalog.insert_projectile(name, projectile);
        }
        for character in self.load_characters()? {
            catalog.insert_character(character);
        }

        let missing = catalog.dangling_references();
        if !missing.is_empty() {
            anyhow::bail!(
                "Content in {} has unresolved references: {}",
                self.data_dir.display(),
                missing.join(", ")
            );
        }

        let instant = catalog.instant_ongoing_effects();
        if !instant.is_empty() {
            anyhow::bail!(
                "Content in {} equips instant effects: {}",
                self.data_dir.display(),
                instant.join(", ")
            );
        }

        debug!(
            target: "action::content",
            effects = catalog.effect_count(),
            abilities = catalog.ability_count(),
            items = catalog.item_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use action_core::{AttributeKind, DurationPolicy, ItemDefId, Magnitude};

    use super::*;

    const EFFECTS: &str = r#"(
        effects: [
            (
                id: "GE_Crouch",
                duration: Infinite,
                modifiers: [(attribute: MaxMovementSpeed, magnitude: Scalar(-200.0))],
            ),
            (
                id: "GE_Damage",
                duration: Instant,
                modifiers: [(attribute: Health, magnitude: SetByCaller("Attribute.Health"))],
            ),
        ],
    )"#;

    const ABILITIES: &str = r#"(
        abilities: [
            (id: "GA_Fire", event_triggers: ["Event.Attack.Started"], behavior: Instant),
        ],
    )"#;

    const ITEMS: &str = r#"(
        items: [
            (
                id: "Rifle",
                name: "Rifle",
                kind: Weapon((
                    damage_effect: Some("GE_Damage"),
                    base_damage: 20.0,
                    fire_rate: 4.0,
                    mesh: Skeletal("SK_Rifle"),
                )),
                capabilities: "EQUIPPABLE | DROPPABLE",
                attachment_socket: Some("hand_r"),
                granted_abilities: ["GA_Fire"],
            ),
        ],
        projectiles: {
            "Rocket": (base_damage: 50.0, damage_radius: 300.0, effects: ["GE_Damage"]),
        },
    )"#;

    const CHARACTERS: &str = r#"(
        characters: [
            (name: "Hero", crouch_state_effect: Some("GE_Crouch"), in_air_tags: ["State.InAir"]),
        ],
    )"#;

    fn write_content(dir: &Path, items: &str) {
        fs::write(dir.join("config.toml"), "debug_radial_damage = true\n").unwrap();
        fs::write(dir.join("effects.ron"), EFFECTS).unwrap();
        fs::write(dir.join("abilities.ron"), ABILITIES).unwrap();
        fs::write(dir.join("items.ron"), items).unwrap();
        fs::write(dir.join("characters.ron"), CHARACTERS).unwrap();
    }

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn loads_complete_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path(), ITEMS);
        let factory = ContentFactory::new(dir.path());

        assert!(factory.load_config().unwrap().debug_radial_damage);

        let catalog = factory.load_catalog().unwrap();
        assert_eq!(catalog.effect_count(), 2);
        assert_eq!(catalog.ability_count(), 1);
        assert_eq!(catalog.item_count(), 1);
        assert_eq!(catalog.character_names().collect::<Vec<_>>(), ["Hero"]);

        let env = action_core::Env::from_catalog(&catalog);
        let rifle = env.item(&ItemDefId::new("Rifle")).unwrap();
        assert!(rifle.can_be_equipped() && rifle.can_be_dropped());
        assert_eq!(rifle.attachment_socket.as_deref(), Some("hand_r"));

        let damage = env.effect(&"GE_Damage".into()).unwrap();
        assert_eq!(damage.duration, DurationPolicy::Instant);
        assert_eq!(damage.modifiers[0].attribute, AttributeKind::Health);
        assert!(matches!(damage.modifiers[0].magnitude, Magnitude::SetByCaller(_)));

        let rocket = catalog.projectile("Rocket").unwrap();
        assert_eq!(rocket.damage_radius, 300.0);
    }

    #[test]
    fn dangling_reference_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path(), &ITEMS.replace("\"GA_Fire\"]", "\"GA_Missing\"]"));

        let err = ContentFactory::new(dir.path()).load_catalog().unwrap_err();
        assert!(err.to_string().contains("GA_Missing"));
    }

    #[test]
    fn instant_ongoing_effect_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_content(
            dir.path(),
            &ITEMS.replace(
                "granted_abilities: [\"GA_Fire\"],",
                "granted_abilities: [\"GA_Fire\"], ongoing_effects: [\"GE_Damage\"],",
            ),
        );

        let err = ContentFactory::new(dir.path()).load_catalog().unwrap_err();
        assert!(err.to_string().contains("instant ongoing effect 'GE_Damage'"));
    }

    #[test]
    fn loads_shipped_content() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        assert!(!factory.load_config().unwrap().debug_radial_damage);

        let catalog = factory.load_catalog().unwrap();
        assert_eq!(catalog.character_names().collect::<Vec<_>>(), ["Dummy", "Hero"]);
        assert!(catalog.projectile("Rocket").is_some());
        assert!(catalog.projectile("Grenade").is_some());

        let env = action_core::Env::from_catalog(&catalog);
        let crouch = env.effect(&"GE_Crouch".into()).unwrap();
        assert_eq!(crouch.modifiers[0].attribute, AttributeKind::MaxMovementSpeed);
        let regen = env.effect(&"GE_Regen".into()).unwrap();
        assert_eq!(regen.duration, DurationPolicy::Duration { ticks: 5 });
        let rifle = env.item(&ItemDefId::new("Rifle")).unwrap();
        assert_eq!(rifle.granted_abilities.len(), 2);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentFactory::new(dir.path()).load_effects().unwrap_err();
        assert!(err.to_string().contains("effects.ron"));
    }
}
