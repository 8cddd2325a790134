use std::collections::BTreeMap;

use tracing::trace;

use super::ReplicationObserver;
use crate::env::{AnimationProfileRef, CharacterData, ItemDefId, ItemOracle};
use crate::item::{ItemInstanceId, ItemState, ItemSummary};
use crate::state::EntityId;

/// Presentation state an observer derives for one entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityPresentation {
    pub character_data: Option<CharacterData>,
    /// Inventory membership in authority order.
    pub inventory: Vec<ItemInstanceId>,
    /// Visual currently attached to the entity.
    pub equipped_visual: Option<(ItemInstanceId, ItemDefId)>,
    /// Profile chosen from the equipped item, falling back to character data.
    pub animation_profile: Option<AnimationProfileRef>,
    pub dropped: Vec<(ItemInstanceId, ItemDefId)>,
    equipped: BTreeMap<ItemInstanceId, (ItemDefId, u64)>,
}

impl EntityPresentation {
    pub fn equipped_count(&self) -> usize {
        self.equipped.len()
    }
}

/// Observer-side replica that re-derives presentation from replicated fields.
///
/// Each field is stored as last received and presentation is recomputed from
/// the stored fields after every change, so applying a change twice or
/// receiving fields in a different order converges to the same result.
pub struct ObserverMirror<'a> {
    items: Option<&'a dyn ItemOracle>,
    entities: BTreeMap<EntityId, EntityPresentation>,
    sequence: u64,
}

impl<'a> ObserverMirror<'a> {
    pub fn new(items: Option<&'a dyn ItemOracle>) -> Self {
        Self {
            items,
            entities: BTreeMap::new(),
            sequence: 0,
        }
    }

    pub fn entity(&self, entity: EntityId) -> Option<&EntityPresentation> {
        self.entities.get(&entity)
    }

    pub fn equipped_visual(&self, entity: EntityId) -> Option<&ItemDefId> {
        self.entity(entity)?
            .equipped_visual
            .as_ref()
            .map(|(_, definition)| definition)
    }

    pub fn animation_profile(&self, entity: EntityId) -> Option<&AnimationProfileRef> {
        self.entity(entity)?.animation_profile.as_ref()
    }

    fn rederive(&mut self, entity: EntityId) {
        let items = self.items;
        let Some(view) = self.entities.get_mut(&entity) else {
            return;
        };

        // While fields are in flight more than one item may read as equipped;
        // the most recently equipped one wins.
        view.equipped_visual = view
            .equipped
            .iter()
            .max_by_key(|(_, (_, seq))| *seq)
            .map(|(id, (definition, _))| (*id, definition.clone()));

        let item_profile = view.equipped_visual.as_ref().and_then(|(_, definition)| {
            items
                .and_then(|oracle| oracle.item(definition))
                .and_then(|definition| definition.animation_profile.clone())
        });
        view.animation_profile = item_profile.or_else(|| {
            view.character_data
                .as_ref()
                .and_then(|data| data.animation_profile.clone())
        });

        trace!(
            target: "action::replication",
            entity = %entity,
            visual = ?view.equipped_visual,
            "presentation re-derived"
        );
    }
}

impl ReplicationObserver for ObserverMirror<'_> {
    fn on_character_data_changed(&mut self, entity: EntityId, data: &CharacterData) {
        self.entities.entry(entity).or_default().character_data = Some(data.clone());
        self.rederive(entity);
    }

    fn on_item_equipped_changed(
        &mut self,
        entity: EntityId,
        item: ItemInstanceId,
        definition: &ItemDefId,
        equipped: bool,
    ) {
        let view = self.entities.entry(entity).or_default();
        if equipped {
            if !view.equipped.contains_key(&item) {
                self.sequence += 1;
                view.equipped.insert(item, (definition.clone(), self.sequence));
            }
        } else {
            view.equipped.remove(&item);
        }
        self.rederive(entity);
    }

    fn on_item_state_changed(
        &mut self,
        entity: EntityId,
        item: ItemInstanceId,
        definition: &ItemDefId,
        state: ItemState,
    ) {
        let view = self.entities.entry(entity).or_default();
        view.dropped.retain(|(id, _)| *id != item);
        if state == ItemState::Dropped {
            view.dropped.push((item, definition.clone()));
        }
        self.rederive(entity);
    }

    fn on_inventory_changed(&mut self, entity: EntityId, items: &[ItemSummary]) {
        self.entities.entry(entity).or_default().inventory =
            items.iter().map(|summary| summary.id).collect();
        self.rederive(entity);
    }
}
