//! Per-pair override storage with a sealed-after-first-build lifecycle
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::builder::{derive_plan, Overrides};
use super::{MappingPlan, MemberMapEntry};
use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::types::TypeRef;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Source/target type pair owning a plan
pub type PlanPair = (TypeRef, TypeRef);

#[derive(Debug, Default)]
struct PlanSlot {
    overrides: Overrides,
    /// Set once a compiled mapper consumed the plan
    sealed: Option<Arc<MappingPlan>>,
    discovered: bool,
}

/// Registry of mapping plans keyed by type pair
///
/// Plans stay mutable until [`PlanRegistry::seal`] is called for their pair.
/// Sealed plans are shared read-only with every compiled mapper built from
/// them, so compiled mappers never need to lock the registry while running.
#[derive(Debug, Default)]
pub struct PlanRegistry {
    slots: Mutex<HashMap<PlanPair, PlanSlot>>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn sealed_error(pair: &PlanPair) -> Error {
        Error::setup(
            "mapping plan is already compiled; register customizations before the first mapping",
            &pair.0,
            &pair.1,
        )
    }

    pub fn is_sealed(&self, pair: &PlanPair) -> bool {
        self.slots
            .lock()
            .get(pair)
            .is_some_and(|slot| slot.sealed.is_some())
    }

    fn check_open(slots: &HashMap<PlanPair, PlanSlot>, pair: &PlanPair) -> Result<()> {
        if slots.get(pair).is_some_and(|slot| slot.sealed.is_some()) {
            return Err(Self::sealed_error(pair));
        }
        Ok(())
    }

    fn upsert(slots: &mut HashMap<PlanPair, PlanSlot>, pair: &PlanPair, entry: MemberMapEntry) {
        let slot = slots.entry(pair.clone()).or_default();
        let target_member = entry.target_member.clone();
        let source_label = entry.source_label().to_string();
        if slot.overrides.upsert(entry) {
            log::warn!(
                "override for {}.{} replaced by '{}' ({} -> {})",
                pair.1,
                target_member,
                source_label,
                pair.0,
                pair.1
            );
        } else {
            log::debug!(
                "registered override {}.{} <- '{}' ({} -> {})",
                pair.1,
                target_member,
                source_label,
                pair.0,
                pair.1
            );
        }
    }

    /// Install or replace the override for the entry's target member
    pub fn register(&self, pair: &PlanPair, entry: MemberMapEntry) -> Result<()> {
        let mut slots = self.slots.lock();
        Self::check_open(&slots, pair)?;
        Self::upsert(&mut slots, pair, entry);
        Ok(())
    }

    /// Install a forward override and its mirror together
    ///
    /// Both plans must be open; if either is sealed neither is touched.
    pub fn register_pair(
        &self,
        pair: &PlanPair,
        entry: MemberMapEntry,
        reverse_pair: &PlanPair,
        reverse: MemberMapEntry,
    ) -> Result<()> {
        let mut slots = self.slots.lock();
        Self::check_open(&slots, pair)?;
        Self::check_open(&slots, reverse_pair)?;
        Self::upsert(&mut slots, pair, entry);
        Self::upsert(&mut slots, reverse_pair, reverse);
        Ok(())
    }

    /// Remove the override for a target member; returns whether one existed
    pub fn unregister(&self, pair: &PlanPair, target_member: &str) -> Result<bool> {
        let mut slots = self.slots.lock();
        Self::check_open(&slots, pair)?;
        Ok(slots
            .get_mut(pair)
            .is_some_and(|slot| slot.overrides.remove(target_member)))
    }

    /// Remove a forward override and its mirror together
    ///
    /// Returns whether either override existed.
    pub fn unregister_pair(
        &self,
        pair: &PlanPair,
        target_member: &str,
        reverse_pair: &PlanPair,
        reverse_member: &str,
    ) -> Result<bool> {
        let mut slots = self.slots.lock();
        Self::check_open(&slots, pair)?;
        Self::check_open(&slots, reverse_pair)?;
        let forward = slots
            .get_mut(pair)
            .is_some_and(|slot| slot.overrides.remove(target_member));
        let mirror = slots
            .get_mut(reverse_pair)
            .is_some_and(|slot| slot.overrides.remove(reverse_member));
        Ok(forward || mirror)
    }

    /// Exclude a target member from the default correspondence
    pub fn ignore(&self, pair: &PlanPair, target_member: &str) -> Result<()> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(pair.clone()).or_default();
        if slot.sealed.is_some() {
            return Err(Self::sealed_error(pair));
        }
        slot.overrides.ignore(target_member);
        Ok(())
    }

    /// Mark the pair as discovered; true only for the first caller
    pub fn mark_discovered(&self, pair: &PlanPair) -> bool {
        let mut slots = self.slots.lock();
        let slot = slots.entry(pair.clone()).or_default();
        !std::mem::replace(&mut slot.discovered, true)
    }

    /// Materialize and seal the plan for a pair
    ///
    /// The first call derives the plan from the shapes and the registered
    /// overrides; every later call returns the same plan.
    pub fn seal(&self, source: &Shape, target: &Shape) -> Arc<MappingPlan> {
        let pair = (source.ty().clone(), target.ty().clone());
        let mut slots = self.slots.lock();
        let slot = slots.entry(pair).or_default();
        if let Some(plan) = &slot.sealed {
            return plan.clone();
        }
        let plan = Arc::new(derive_plan(source, target, &slot.overrides));
        log::debug!(
            "sealed mapping plan {} -> {} with {} entries",
            source.ty(),
            target.ty(),
            plan.len()
        );
        slot.sealed = Some(plan.clone());
        plan
    }

    /// The plan as it stands, without sealing it
    pub fn current(&self, source: &Shape, target: &Shape) -> Arc<MappingPlan> {
        let pair = (source.ty().clone(), target.ty().clone());
        let slots = self.slots.lock();
        match slots.get(&pair) {
            Some(PlanSlot {
                sealed: Some(plan), ..
            }) => plan.clone(),
            Some(slot) => Arc::new(derive_plan(source, target, &slot.overrides)),
            None => Arc::new(derive_plan(source, target, &Overrides::default())),
        }
    }

    /// Registration history for a pair, oldest first
    pub fn history(&self, pair: &PlanPair) -> Vec<String> {
        self.slots
            .lock()
            .get(pair)
            .map(|slot| slot.overrides.history().to_vec())
            .unwrap_or_default()
    }
}
