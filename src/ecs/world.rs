//! Component store: a hecs world plus a table of per-type singletons.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Entity/component store used by the physics pipeline.
///
/// Entities and their components live in the wrapped [`hecs::World`], which is
/// reachable through `Deref`, so `world.spawn(..)`, `world.query::<..>()` and
/// friends work unchanged. On top of that the store keeps at most one
/// singleton value per type.
#[derive(Default)]
pub struct World {
    entities: hecs::World,
    singletons: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities matching the query `Q`, ordered by entity id.
    ///
    /// Use `hecs::Without<A, B>` for "all of A, none of B" filters. Ordering by
    /// id keeps the result independent of archetype layout.
    pub fn filter<Q: hecs::Query>(&self) -> Vec<hecs::Entity> {
        let mut found: Vec<hecs::Entity> = self
            .entities
            .query::<Q>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        found.sort_by_key(|entity| entity.id());
        found
    }

    /// Insert or replace the singleton of type `T`, returning the previous value.
    pub fn insert_singleton<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.singletons
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn singleton<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.singletons
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn singleton_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.singletons
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Fetch the singleton of type `T`, creating it with `Default` first if needed.
    pub fn get_or_insert_singleton<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        let slot = self
            .singletons
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("singleton table keyed by TypeId holds a foreign type"),
        }
    }

    pub fn remove_singleton<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.singletons
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }
}

impl Deref for World {
    type Target = hecs::World;

    fn deref(&self) -> &hecs::World {
        &self.entities
    }
}

impl DerefMut for World {
    fn deref_mut(&mut self) -> &mut hecs::World {
        &mut self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Counter(u32);

    struct Marker;
    struct Excluded;

    #[test]
    fn test_singleton_get_or_insert() {
        let mut world = World::new();
        assert!(world.singleton::<Counter>().is_none());

        world.get_or_insert_singleton::<Counter>().0 += 2;
        world.get_or_insert_singleton::<Counter>().0 += 3;

        assert_eq!(world.singleton::<Counter>(), Some(&Counter(5)));
    }

    #[test]
    fn test_singleton_replace_and_remove() {
        let mut world = World::new();
        assert!(world.insert_singleton(Counter(1)).is_none());
        assert_eq!(world.insert_singleton(Counter(7)), Some(Counter(1)));

        if let Some(counter) = world.singleton_mut::<Counter>() {
            counter.0 += 1;
        }
        assert_eq!(world.remove_singleton::<Counter>(), Some(Counter(8)));
        assert!(world.singleton::<Counter>().is_none());
    }

    #[test]
    fn test_filter_all_of_none_of() {
        let mut world = World::new();
        let a = world.spawn((Marker,));
        let _b = world.spawn((Marker, Excluded));
        let c = world.spawn((Marker, 1.0f32));

        let found = world.filter::<hecs::Without<&Marker, &Excluded>>();
        assert_eq!(found, vec![a, c]);
    }

    #[test]
    fn test_filter_order_is_by_id() {
        let mut world = World::new();
        let first = world.spawn((Marker, 1u8));
        let second = world.spawn((Marker,));
        let third = world.spawn((Marker, 2u8));

        let found = world.filter::<&Marker>();
        assert_eq!(found, vec![first, second, third]);
    }
}
