//! Explicit field mappings for related types whose fields are named differently.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::catalog::ComponentType;

use super::resolver::FieldMapping;

type Renames = &'static [(&'static str, &'static str)];

const KERATOMETRY_TO_REFRACTION: Renames = &[
    ("r_k1", "r_sph"),
    ("r_k2", "r_cyl"),
    ("r_axis", "r_ax"),
    ("l_k1", "l_sph"),
    ("l_k2", "l_cyl"),
    ("l_axis", "l_ax"),
];

const PRISM_TO_SINGLE: Renames = &[
    ("r_pr_h", "r_pris"),
    ("r_base_h", "r_base"),
    ("l_pr_h", "l_pris"),
    ("l_base_h", "l_base"),
];

const SINGLE_TO_PRISM: Renames = &[
    ("r_pris", "r_pr_h"),
    ("r_base", "r_base_h"),
    ("l_pris", "l_pr_h"),
    ("l_base", "l_base_h"),
];

const READING_TO_ADD: Renames = &[("r_read", "r_ad"), ("l_read", "l_ad")];

/// Source type, target type, and the renamed field pairs.
///
/// Fields with the same name in both schemas map onto each other without
/// being listed.
const RENAMES: &[(ComponentType, ComponentType, Renames)] = &[
    (ComponentType::Keratometer, ComponentType::Objective, KERATOMETRY_TO_REFRACTION),
    (ComponentType::Keratometer, ComponentType::Subjective, KERATOMETRY_TO_REFRACTION),
    (ComponentType::Keratometer, ComponentType::FinalSubjective, KERATOMETRY_TO_REFRACTION),
    (ComponentType::Keratometer, ComponentType::Retinoscop, KERATOMETRY_TO_REFRACTION),
    (
        ComponentType::Keratometer,
        ComponentType::KeratometerFull,
        &[
            ("r_k1", "r_dpt_k1"),
            ("r_k2", "r_dpt_k2"),
            ("r_axis", "r_mer_k1"),
            ("l_k1", "l_dpt_k1"),
            ("l_k2", "l_dpt_k2"),
            ("l_axis", "l_mer_k1"),
        ],
    ),
    (
        ComponentType::KeratometerFull,
        ComponentType::Keratometer,
        &[
            ("r_dpt_k1", "r_k1"),
            ("r_dpt_k2", "r_k2"),
            ("r_mer_k1", "r_axis"),
            ("l_dpt_k1", "l_k1"),
            ("l_dpt_k2", "l_k2"),
            ("l_mer_k1", "l_axis"),
        ],
    ),
    (
        ComponentType::Keratometer,
        ComponentType::KeratometerContactLens,
        &[
            ("r_k1", "r_rh"),
            ("r_k2", "r_rv"),
            ("r_axis", "r_ax"),
            ("l_k1", "l_rh"),
            ("l_k2", "l_rv"),
            ("l_axis", "l_ax"),
        ],
    ),
    (
        ComponentType::KeratometerContactLens,
        ComponentType::Keratometer,
        &[
            ("r_rh", "r_k1"),
            ("r_rv", "r_k2"),
            ("r_ax", "r_axis"),
            ("l_rh", "l_k1"),
            ("l_rv", "l_k2"),
            ("l_ax", "l_axis"),
        ],
    ),
    (ComponentType::FinalSubjective, ComponentType::FinalPrescription, PRISM_TO_SINGLE),
    (ComponentType::FinalPrescription, ComponentType::FinalSubjective, SINGLE_TO_PRISM),
    (
        ComponentType::OldRefractionExtension,
        ComponentType::OldRefraction,
        &[
            ("r_pr_h", "r_pris"),
            ("r_base_h", "r_base"),
            ("r_ad_read", "r_ad"),
            ("l_pr_h", "l_pris"),
            ("l_base_h", "l_base"),
            ("l_ad_read", "l_ad"),
        ],
    ),
    (ComponentType::Addition, ComponentType::FinalPrescription, READING_TO_ADD),
    (ComponentType::Addition, ComponentType::CompactPrescription, READING_TO_ADD),
];

static OVERRIDES: Lazy<HashMap<(ComponentType, ComponentType), FieldMapping>> = Lazy::new(|| {
    RENAMES
        .iter()
        .map(|(source, target, renames)| {
            let mut mapping = FieldMapping::shared_names(*source, *target);
            for (from, to) in renames.iter() {
                mapping.insert(*from, Some(*to));
            }
            ((*source, *target), mapping)
        })
        .collect()
});

/// The explicit mapping for a pair, if one is defined.
pub(crate) fn lookup(source: ComponentType, target: ComponentType) -> Option<&'static FieldMapping> {
    OVERRIDES.get(&(source, target))
}

/// Whether an explicit mapping exists from `source` to `target`.
pub(crate) fn has_override(source: ComponentType, target: ComponentType) -> bool {
    OVERRIDES.contains_key(&(source, target))
}
