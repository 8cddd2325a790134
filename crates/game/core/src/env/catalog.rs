use std::collections::BTreeMap;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::env::{
    AbilityDefinition, AbilityId, AbilityOracle, CharacterDefinition, EffectDefinition, EffectId,
    EffectOracle, ItemDefId, ItemDefinition, ItemKind, ItemOracle, ProjectileDefinition,
};

/// In-memory definition store backing every oracle.
///
/// Content loaders fill a catalog once at startup; the simulation only ever
/// reads from it through [`crate::env::Env`].
#[derive(Clone, Debug, Default)]
pub struct DefinitionCatalog {
    effects: BTreeMap<EffectId, Arc<EffectDefinition>>,
    abilities: BTreeMap<AbilityId, Arc<AbilityDefinition>>,
    items: BTreeMap<ItemDefId, Arc<ItemDefinition>>,
    characters: BTreeMap<SmolStr, Arc<CharacterDefinition>>,
    projectiles: BTreeMap<SmolStr, Arc<ProjectileDefinition>>,
}

impl DefinitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an effect definition, replacing any previous one with the
    /// same id.
    pub fn insert_effect(&mut self, definition: EffectDefinition) -> Arc<EffectDefinition> {
        let definition = Arc::new(definition);
        self.effects
            .insert(definition.id.clone(), Arc::clone(&definition));
        definition
    }

    pub fn insert_ability(&mut self, definition: AbilityDefinition) -> Arc<AbilityDefinition> {
        let definition = Arc::new(definition);
        self.abilities
            .insert(definition.id.clone(), Arc::clone(&definition));
        definition
    }

    pub fn insert_item(&mut self, definition: ItemDefinition) -> Arc<ItemDefinition> {
        let definition = Arc::new(definition);
        self.items
            .insert(definition.id.clone(), Arc::clone(&definition));
        definition
    }

    pub fn insert_character(
        &mut self,
        definition: CharacterDefinition,
    ) -> Arc<CharacterDefinition> {
        let definition = Arc::new(definition);
        self.characters
            .insert(definition.name.clone(), Arc::clone(&definition));
        definition
    }

    pub fn insert_projectile(
        &mut self,
        name: impl AsRef<str>,
        definition: ProjectileDefinition,
    ) -> Arc<ProjectileDefinition> {
        let definition = Arc::new(definition);
        self.projectiles
            .insert(SmolStr::new(name.as_ref()), Arc::clone(&definition));
        definition
    }

    pub fn character(&self, name: &str) -> Option<Arc<CharacterDefinition>> {
        self.characters.get(name).cloned()
    }

    pub fn projectile(&self, name: &str) -> Option<Arc<ProjectileDefinition>> {
        self.projectiles.get(name).cloned()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn character_names(&self) -> impl Iterator<Item = &str> {
        self.characters.keys().map(SmolStr::as_str)
    }

    /// Lists every id referenced by a definition but not registered here.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let check_effect = |owner: &str, id: &EffectId, missing: &mut Vec<String>| {
            if !self.effects.contains_key(id) {
                missing.push(format!("{owner} -> effect '{id}'"));
            }
        };

        for ability in self.abilities.values() {
            let owner = format!("ability '{}'", ability.id);
            for id in ability
                .effects_to_apply_on_start
                .iter()
                .chain(&ability.effects_to_remove_on_end)
            {
                check_effect(&owner, id, &mut missing);
            }
        }

        for item in self.items.values() {
            let owner = format!("item '{}'", item.id);
            let weapon_effect = match &item.kind {
                ItemKind::Weapon(weapon) => weapon.damage_effect.as_ref(),
                ItemKind::Generic => None,
            };
            for id in item.ongoing_effects.iter().chain(weapon_effect) {
                check_effect(&owner, id, &mut missing);
            }
            for id in &item.granted_abilities {
                if !self.abilities.contains_key(id) {
                    missing.push(format!("{owner} -> ability '{id}'"));
                }
            }
        }

        for character in self.characters.values() {
            let owner = format!("character '{}'", character.name);
            for id in character
                .data
                .startup_effects
                .iter()
                .chain(character.crouch_state_effect.as_ref())
            {
                check_effect(&owner, id, &mut missing);
            }
            for id in &character.data.granted_abilities {
                if !self.abilities.contains_key(id) {
                    missing.push(format!("{owner} -> ability '{id}'"));
                }
            }
        }

        for (name, projectile) in &self.projectiles {
            let owner = format!("projectile '{name}'");
            for id in &projectile.effects {
                check_effect(&owner, id, &mut missing);
            }
        }

        missing
    }

    /// Lists item ongoing effects that are Instant. Those would change base
    /// values on every equip with nothing for unequip to revert.
    pub fn instant_ongoing_effects(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for item in self.items.values() {
            for id in &item.ongoing_effects {
                if let Some(effect) = self.effects.get(id)
                    && effect.is_instant()
                {
                    problems.push(format!("item '{}' -> instant ongoing effect '{id}'", item.id));
                }
            }
        }
        problems
    }
}

impl EffectOracle for DefinitionCatalog {
    fn effect(&self, id: &EffectId) -> Option<Arc<EffectDefinition>> {
        self.effects.get(id).cloned()
    }
}

impl AbilityOracle for DefinitionCatalog {
    fn ability(&self, id: &AbilityId) -> Option<Arc<AbilityDefinition>> {
        self.abilities.get(id).cloned()
    }
}

impl ItemOracle for DefinitionCatalog {
    fn item(&self, id: &ItemDefId) -> Option<Arc<ItemDefinition>> {
        self.items.get(id).cloned()
    }
}
