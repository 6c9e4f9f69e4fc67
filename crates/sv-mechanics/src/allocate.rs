//! Damage allocation.
//!
//! Damage goes to the model currently being targeted until it dies, then
//! overflows to the next alive model in unit order. The current target is
//! an already-wounded model if there is one, otherwise the first alive
//! model. Precision allocation restricts the eligible models to the unit's
//! CHARACTER models and never overflows past them.

use serde::{Deserialize, Serialize};
use sv_core::Model;

/// How damage is distributed within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Any alive model, in unit order.
    Normal,
    /// Only the listed CHARACTER models.
    Precision,
}

/// What one allocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Wounds actually removed.
    pub damage_applied: u32,
    /// Models killed.
    pub casualties: u32,
    /// Damage left over with no eligible model to take it.
    pub unallocated: u32,
    /// Indices of the models that took damage, in order.
    pub models: Vec<usize>,
}

/// The order in which eligible alive models receive damage.
pub fn allocation_order(models: &[Model], mode: AllocationMode, characters: &[usize]) -> Vec<usize> {
    let eligible: Vec<usize> = match mode {
        AllocationMode::Normal => (0..models.len()).collect(),
        AllocationMode::Precision => {
            let mut list: Vec<usize> = characters
                .iter()
                .copied()
                .filter(|&i| i < models.len())
                .collect();
            list.sort_unstable();
            list.dedup();
            list
        }
    };
    let alive: Vec<usize> = eligible
        .into_iter()
        .filter(|&i| models[i].is_alive())
        .collect();

    match alive.iter().position(|&i| models[i].is_wounded()) {
        Some(pos) => {
            let mut order = Vec::with_capacity(alive.len());
            order.push(alive[pos]);
            order.extend(alive.iter().copied().filter(|&i| i != alive[pos]));
            order
        }
        None => alive,
    }
}

/// The model that would take the next point of damage.
pub fn current_target(models: &[Model], mode: AllocationMode, characters: &[usize]) -> Option<usize> {
    allocation_order(models, mode, characters).first().copied()
}

/// Remove `damage` wounds from `models`.
///
/// Stops once the damage is spent or no eligible model is alive. A model
/// never drops below zero wounds and a dead model is never revived.
pub fn allocate(
    models: &mut [Model],
    damage: u32,
    mode: AllocationMode,
    characters: &[usize],
) -> Allocation {
    let mut allocation = Allocation::default();
    let mut remaining = damage;

    for index in allocation_order(models, mode, characters) {
        if remaining == 0 {
            break;
        }
        let model = &mut models[index];
        let applied = model.take_damage(remaining);
        remaining -= applied;
        allocation.damage_applied += applied;
        allocation.models.push(index);
        if !model.is_alive() {
            allocation.casualties += 1;
        }
    }

    allocation.unallocated = remaining;
    allocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn models(wounds: &[u32]) -> Vec<Model> {
        wounds
            .iter()
            .enumerate()
            .map(|(i, &w)| Model::new(format!("m{i}"), w))
            .collect()
    }

    #[test]
    fn normal_overflows_in_unit_order() {
        let mut ms = models(&[2, 2, 2]);
        let a = allocate(&mut ms, 5, AllocationMode::Normal, &[]);
        assert_eq!(a.damage_applied, 5);
        assert_eq!(a.casualties, 2);
        assert_eq!(a.unallocated, 0);
        assert_eq!(a.models, vec![0, 1, 2]);
        assert_eq!(ms[2].wounds, 1);
    }

    #[test]
    fn wounded_model_is_targeted_first() {
        let mut ms = models(&[3, 3, 3]);
        ms[1].take_damage(1);
        let a = allocate(&mut ms, 2, AllocationMode::Normal, &[]);
        assert_eq!(a.models, vec![1]);
        assert!(!ms[1].is_alive());
        assert_eq!(ms[0].wounds, 3);
    }

    #[test]
    fn damage_beyond_the_unit_is_unallocated() {
        let mut ms = models(&[1, 1]);
        let a = allocate(&mut ms, 5, AllocationMode::Normal, &[]);
        assert_eq!(a.damage_applied, 2);
        assert_eq!(a.unallocated, 3);
        assert_eq!(a.casualties, 2);
    }

    #[test]
    fn precision_hits_only_characters() {
        let mut ms = models(&[1; 10]);
        let a = allocate(&mut ms, 3, AllocationMode::Precision, &[4]);
        assert_eq!(a.damage_applied, 1);
        assert_eq!(a.casualties, 1);
        assert_eq!(a.unallocated, 2);
        assert!(!ms[4].is_alive());
        let untouched = ms
            .iter()
            .enumerate()
            .filter(|(i, m)| *i != 4 && m.wounds == 1)
            .count();
        assert_eq!(untouched, 9);
    }

    #[test]
    fn precision_with_no_alive_characters_does_nothing() {
        let mut ms = models(&[1, 1]);
        ms[1].take_damage(1);
        let a = allocate(&mut ms, 2, AllocationMode::Precision, &[1]);
        assert_eq!(a, Allocation {
            unallocated: 2,
            ..Allocation::default()
        });
        assert!(ms[0].is_alive());
    }

    #[test]
    fn precision_ignores_bad_indices() {
        let ms = models(&[1, 1]);
        assert_eq!(allocation_order(&ms, AllocationMode::Precision, &[7, 1, 1]), vec![1]);
    }

    proptest! {
        #[test]
        fn allocation_conserves_wounds(
            wounds in proptest::collection::vec(1u32..5, 1..8),
            damage in 0u32..30,
            precise in any::<bool>(),
        ) {
            let mut ms = models(&wounds);
            let before: u32 = ms.iter().map(|m| m.wounds).sum();
            let mode = if precise { AllocationMode::Precision } else { AllocationMode::Normal };
            let a = allocate(&mut ms, damage, mode, &[0]);
            let after: u32 = ms.iter().map(|m| m.wounds).sum();
            prop_assert_eq!(before - after, a.damage_applied);
            prop_assert_eq!(a.damage_applied + a.unallocated, damage);
            for m in &ms {
                prop_assert!(m.wounds <= m.max_wounds);
            }
            if precise {
                prop_assert!(ms[1..].iter().all(|m| m.wounds == m.max_wounds));
            }
        }
    }
}
