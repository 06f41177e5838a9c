#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod color;
pub mod material;

use std::collections::BTreeMap;

pub use color::Rgba;
pub use material::Material;

/// Count of samples removed per material by a single edit.
///
/// Ordered by material so iteration (and anything logged or serialized from it) is deterministic.
pub type MaterialTally = BTreeMap<Material, u32>;

/// Sum all counts in a tally.
pub fn tally_total(tally: &MaterialTally) -> u32 {
    tally.values().sum()
}

/// Merge `other` into `into`, adding counts for shared materials.
pub fn merge_tally(into: &mut MaterialTally, other: &MaterialTally) {
    for (material, count) in other {
        *into.entry(*material).or_insert(0) += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_total_sums_counts() {
        let mut tally = MaterialTally::new();
        tally.insert(Material::Dirt, 3);
        tally.insert(Material::IronOre, 2);
        assert_eq!(tally_total(&tally), 5);
        assert_eq!(tally_total(&MaterialTally::new()), 0);
    }

    #[test]
    fn merge_tally_adds_shared_entries() {
        let mut a = MaterialTally::new();
        a.insert(Material::Dirt, 1);
        let mut b = MaterialTally::new();
        b.insert(Material::Dirt, 4);
        b.insert(Material::GoldOre, 1);

        merge_tally(&mut a, &b);

        assert_eq!(a[&Material::Dirt], 5);
        assert_eq!(a[&Material::GoldOre], 1);
    }

    #[test]
    fn tally_iterates_in_material_order() {
        let mut tally = MaterialTally::new();
        tally.insert(Material::DiamondOre, 1);
        tally.insert(Material::Grass, 1);
        tally.insert(Material::Granite, 1);

        let order: Vec<_> = tally.keys().copied().collect();
        assert_eq!(
            order,
            vec![Material::Grass, Material::Granite, Material::DiamondOre]
        );
    }
}
