//! The closed set of measurement component types and their field schemas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VistaError;

/// A measurement component type.
///
/// Each variant owns a fixed, ordered field schema. The kebab-case slug
/// (`objective`, `cover-test`, ...) is the identifier used in layout data and
/// card keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    OldRefraction,
    OldRefractionExtension,
    Objective,
    Subjective,
    FinalSubjective,
    FinalPrescription,
    CompactPrescription,
    Addition,
    Retinoscop,
    RetinoscopDilation,
    OverRefraction,
    UncorrectedVa,
    Keratometer,
    KeratometerFull,
    KeratometerContactLens,
    CornealTopography,
    CoverTest,
    Anamnesis,
    Notes,
    StereoTest,
    OcularMotorAssessment,
    SensationVisionStability,
    DiopterAdjustmentPanel,
    FusionRange,
    MaddoxRod,
    SchirmerTest,
    ContactLensDiameters,
    ContactLensDetails,
    ContactLensExam,
    ContactLensOrder,
    OldContactLenses,
}

/// Spectacle refraction tables sharing the sphere/cylinder/axis fields.
const REFRACTION: &[ComponentType] = &[
    ComponentType::OldRefraction,
    ComponentType::OldRefractionExtension,
    ComponentType::Objective,
    ComponentType::Subjective,
    ComponentType::FinalSubjective,
    ComponentType::FinalPrescription,
    ComponentType::CompactPrescription,
    ComponentType::Retinoscop,
    ComponentType::RetinoscopDilation,
    ComponentType::OverRefraction,
];

/// Subjective results may also seed a contact lens exam.
const SUBJECTIVE_TARGETS: &[ComponentType] = &[
    ComponentType::OldRefraction,
    ComponentType::OldRefractionExtension,
    ComponentType::Objective,
    ComponentType::Subjective,
    ComponentType::FinalSubjective,
    ComponentType::FinalPrescription,
    ComponentType::CompactPrescription,
    ComponentType::Retinoscop,
    ComponentType::RetinoscopDilation,
    ComponentType::OverRefraction,
    ComponentType::ContactLensExam,
];

const CONTACT_LENS: &[ComponentType] = &[
    ComponentType::ContactLensExam,
    ComponentType::OldContactLenses,
    ComponentType::ContactLensDetails,
    ComponentType::OverRefraction,
];

impl ComponentType {
    /// Every component type, in catalog order.
    pub const ALL: [ComponentType; 31] = [
        ComponentType::OldRefraction,
        ComponentType::OldRefractionExtension,
        ComponentType::Objective,
        ComponentType::Subjective,
        ComponentType::FinalSubjective,
        ComponentType::FinalPrescription,
        ComponentType::CompactPrescription,
        ComponentType::Addition,
        ComponentType::Retinoscop,
        ComponentType::RetinoscopDilation,
        ComponentType::OverRefraction,
        ComponentType::UncorrectedVa,
        ComponentType::Keratometer,
        ComponentType::KeratometerFull,
        ComponentType::KeratometerContactLens,
        ComponentType::CornealTopography,
        ComponentType::CoverTest,
        ComponentType::Anamnesis,
        ComponentType::Notes,
        ComponentType::StereoTest,
        ComponentType::OcularMotorAssessment,
        ComponentType::SensationVisionStability,
        ComponentType::DiopterAdjustmentPanel,
        ComponentType::FusionRange,
        ComponentType::MaddoxRod,
        ComponentType::SchirmerTest,
        ComponentType::ContactLensDiameters,
        ComponentType::ContactLensDetails,
        ComponentType::ContactLensExam,
        ComponentType::ContactLensOrder,
        ComponentType::OldContactLenses,
    ];

    /// The identifier used in layout data and card keys.
    pub fn slug(&self) -> &'static str {
        match self {
            ComponentType::OldRefraction => "old-refraction",
            ComponentType::OldRefractionExtension => "old-refraction-extension",
            ComponentType::Objective => "objective",
            ComponentType::Subjective => "subjective",
            ComponentType::FinalSubjective => "final-subjective",
            ComponentType::FinalPrescription => "final-prescription",
            ComponentType::CompactPrescription => "compact-prescription",
            ComponentType::Addition => "addition",
            ComponentType::Retinoscop => "retinoscop",
            ComponentType::RetinoscopDilation => "retinoscop-dilation",
            ComponentType::OverRefraction => "over-refraction",
            ComponentType::UncorrectedVa => "uncorrected-va",
            ComponentType::Keratometer => "keratometer",
            ComponentType::KeratometerFull => "keratometer-full",
            ComponentType::KeratometerContactLens => "keratometer-contact-lens",
            ComponentType::CornealTopography => "corneal-topography",
            ComponentType::CoverTest => "cover-test",
            ComponentType::Anamnesis => "anamnesis",
            ComponentType::Notes => "notes",
            ComponentType::StereoTest => "stereo-test",
            ComponentType::OcularMotorAssessment => "ocular-motor-assessment",
            ComponentType::SensationVisionStability => "sensation-vision-stability",
            ComponentType::DiopterAdjustmentPanel => "diopter-adjustment-panel",
            ComponentType::FusionRange => "fusion-range",
            ComponentType::MaddoxRod => "maddox-rod",
            ComponentType::SchirmerTest => "schirmer-test",
            ComponentType::ContactLensDiameters => "contact-lens-diameters",
            ComponentType::ContactLensDetails => "contact-lens-details",
            ComponentType::ContactLensExam => "contact-lens-exam",
            ComponentType::ContactLensOrder => "contact-lens-order",
            ComponentType::OldContactLenses => "old-contact-lenses",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentType::OldRefraction => "Old Refraction",
            ComponentType::OldRefractionExtension => "Old Refraction (Extended)",
            ComponentType::Objective => "Objective Refraction",
            ComponentType::Subjective => "Subjective Refraction",
            ComponentType::FinalSubjective => "Final Subjective",
            ComponentType::FinalPrescription => "Final Prescription",
            ComponentType::CompactPrescription => "Compact Prescription",
            ComponentType::Addition => "Addition",
            ComponentType::Retinoscop => "Retinoscopy",
            ComponentType::RetinoscopDilation => "Retinoscopy (Dilated)",
            ComponentType::OverRefraction => "Over-Refraction",
            ComponentType::UncorrectedVa => "Uncorrected Visual Acuity",
            ComponentType::Keratometer => "Keratometry",
            ComponentType::KeratometerFull => "Keratometry (Full)",
            ComponentType::KeratometerContactLens => "Keratometry (Contact Lens)",
            ComponentType::CornealTopography => "Corneal Topography",
            ComponentType::CoverTest => "Cover Test",
            ComponentType::Anamnesis => "Anamnesis",
            ComponentType::Notes => "Notes",
            ComponentType::StereoTest => "Stereo Test",
            ComponentType::OcularMotorAssessment => "Ocular Motor Assessment",
            ComponentType::SensationVisionStability => "Sensation / Vision / Stability",
            ComponentType::DiopterAdjustmentPanel => "Diopter Adjustment",
            ComponentType::FusionRange => "Fusion Range",
            ComponentType::MaddoxRod => "Maddox Rod",
            ComponentType::SchirmerTest => "Schirmer Test",
            ComponentType::ContactLensDiameters => "Contact Lens Diameters",
            ComponentType::ContactLensDetails => "Contact Lens Details",
            ComponentType::ContactLensExam => "Contact Lens Exam",
            ComponentType::ContactLensOrder => "Contact Lens Order",
            ComponentType::OldContactLenses => "Old Contact Lenses",
        }
    }

    /// The ordered field schema for this type.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            ComponentType::OldRefraction => &[
                "r_sph", "r_cyl", "r_ax", "r_pris", "r_base", "r_va", "r_ad", "l_sph", "l_cyl",
                "l_ax", "l_pris", "l_base", "l_va", "l_ad", "comb_va",
            ],
            ComponentType::OldRefractionExtension => &[
                "r_sph", "r_cyl", "r_ax", "r_pr_h", "r_base_h", "r_pr_v", "r_base_v", "r_va",
                "r_ad_read", "r_ad_int", "l_sph", "l_cyl", "l_ax", "l_pr_h", "l_base_h", "l_pr_v",
                "l_base_v", "l_va", "l_ad_read", "l_ad_int", "comb_va",
            ],
            ComponentType::Objective => &[
                "r_sph", "r_cyl", "r_ax", "r_se", "l_sph", "l_cyl", "l_ax", "l_se",
            ],
            ComponentType::Subjective => &[
                "r_sph", "r_cyl", "r_ax", "r_pris", "r_base", "r_va", "r_ph", "l_sph", "l_cyl",
                "l_ax", "l_pris", "l_base", "l_va", "l_ph", "comb_va",
            ],
            ComponentType::FinalSubjective => &[
                "r_sph", "r_cyl", "r_ax", "r_pr_h", "r_base_h", "r_pr_v", "r_base_v", "r_va",
                "r_j", "l_sph", "l_cyl", "l_ax", "l_pr_h", "l_base_h", "l_pr_v", "l_base_v",
                "l_va", "l_j", "comb_va", "comb_j",
            ],
            ComponentType::FinalPrescription => &[
                "r_sph", "r_cyl", "r_ax", "r_pris", "r_base", "r_va", "r_ad", "r_pd", "r_high",
                "l_sph", "l_cyl", "l_ax", "l_pris", "l_base", "l_va", "l_ad", "l_pd", "l_high",
                "comb_va", "comb_pd",
            ],
            ComponentType::CompactPrescription => &[
                "r_sph", "r_cyl", "r_ax", "r_va", "r_ad", "l_sph", "l_cyl", "l_ax", "l_va", "l_ad",
            ],
            ComponentType::Addition => &[
                "r_fcc", "r_read", "r_int", "r_bif", "r_mul", "r_j", "l_fcc", "l_read", "l_int",
                "l_bif", "l_mul", "l_j",
            ],
            ComponentType::Retinoscop | ComponentType::RetinoscopDilation => &[
                "r_sph", "r_cyl", "r_ax", "r_reflex", "l_sph", "l_cyl", "l_ax", "l_reflex",
            ],
            ComponentType::OverRefraction => &[
                "r_sph", "r_cyl", "r_ax", "r_va", "r_j", "l_sph", "l_cyl", "l_ax", "l_va", "l_j",
                "comb_va", "comb_j",
            ],
            ComponentType::UncorrectedVa => &[
                "r_fv", "r_iv", "r_nv_j", "l_fv", "l_iv", "l_nv_j", "comb_fv", "comb_iv",
                "comb_nv_j",
            ],
            ComponentType::Keratometer => &["r_k1", "r_k2", "r_axis", "l_k1", "l_k2", "l_axis"],
            ComponentType::KeratometerFull => &[
                "r_dpt_k1", "r_dpt_k2", "r_mm_k1", "r_mm_k2", "r_mer_k1", "r_mer_k2", "r_astig",
                "l_dpt_k1", "l_dpt_k2", "l_mm_k1", "l_mm_k2", "l_mer_k1", "l_mer_k2", "l_astig",
            ],
            ComponentType::KeratometerContactLens => &[
                "r_rh", "r_rv", "r_avg", "r_cyl", "r_ax", "r_ecc", "l_rh", "l_rv", "l_avg",
                "l_cyl", "l_ax", "l_ecc",
            ],
            ComponentType::CornealTopography => &["title", "r_note", "l_note"],
            ComponentType::CoverTest => &[
                "deviation_type", "deviation_direction", "fv_1", "fv_2", "nv_1", "nv_2",
            ],
            ComponentType::Anamnesis => &[
                "chief_complaint", "medications", "allergies", "family_history",
                "previous_surgery",
            ],
            ComponentType::Notes => &["title", "note"],
            ComponentType::StereoTest => &["fly_result", "circle_score", "circle_max"],
            ComponentType::OcularMotorAssessment => &[
                "ocular_motility", "acc_od", "acc_os", "npc_break", "npc_recovery",
            ],
            ComponentType::SensationVisionStability => &[
                "r_sensation", "l_sensation", "r_vision", "l_vision", "r_stability",
                "l_stability", "r_movement", "l_movement",
            ],
            ComponentType::DiopterAdjustmentPanel => &["right_diopter", "left_diopter"],
            ComponentType::FusionRange => &[
                "fv_base_in", "fv_base_in_recovery", "fv_base_out", "fv_base_out_recovery",
                "nv_base_in", "nv_base_in_recovery", "nv_base_out", "nv_base_out_recovery",
            ],
            ComponentType::MaddoxRod => &[
                "c_r_h", "c_r_v", "c_l_h", "c_l_v", "wc_r_h", "wc_r_v", "wc_l_h", "wc_l_v",
            ],
            ComponentType::SchirmerTest => &["r_mm", "l_mm", "r_but", "l_but"],
            ComponentType::ContactLensDiameters => &[
                "pupil_diameter", "corneal_diameter", "eyelid_aperture",
            ],
            ComponentType::ContactLensDetails => &[
                "r_lens_type", "r_model", "r_supplier", "r_material", "r_color", "r_quantity",
                "r_order_quantity", "r_dx", "l_lens_type", "l_model", "l_supplier", "l_material",
                "l_color", "l_quantity", "l_order_quantity", "l_dx",
            ],
            ComponentType::ContactLensExam => &[
                "r_bc", "r_bc_2", "r_oz", "r_diam", "r_sph", "r_cyl", "r_ax", "r_read_ad", "r_va",
                "r_j", "l_bc", "l_bc_2", "l_oz", "l_diam", "l_sph", "l_cyl", "l_ax", "l_read_ad",
                "l_va", "l_j", "comb_va",
            ],
            ComponentType::ContactLensOrder => &[
                "branch", "supply_in_branch", "order_status", "advisor", "deliverer",
                "delivery_date", "priority", "guaranteed_date", "approval_date",
                "cleaning_solution", "disinfection_solution", "rinsing_solution",
            ],
            ComponentType::OldContactLenses => &[
                "r_lens_type", "r_model", "r_bc", "r_diam", "r_sph", "r_cyl", "r_ax", "r_va",
                "l_lens_type", "l_model", "l_bc", "l_diam", "l_sph", "l_cyl", "l_ax", "l_va",
                "comb_va",
            ],
        }
    }

    /// Whether `field` is part of this type's schema.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }

    /// Default copy targets derived by shared field names.
    ///
    /// Every type is additionally compatible with itself; that is handled by
    /// the mapping resolver rather than listed here.
    pub fn compatible_targets(&self) -> &'static [ComponentType] {
        match self {
            ComponentType::Subjective
            | ComponentType::FinalSubjective
            | ComponentType::FinalPrescription => SUBJECTIVE_TARGETS,
            ComponentType::OldRefraction
            | ComponentType::OldRefractionExtension
            | ComponentType::Objective
            | ComponentType::CompactPrescription
            | ComponentType::Retinoscop
            | ComponentType::RetinoscopDilation
            | ComponentType::OverRefraction => REFRACTION,
            ComponentType::ContactLensExam
            | ComponentType::OldContactLenses
            | ComponentType::ContactLensDetails => CONTACT_LENS,
            ComponentType::Addition
            | ComponentType::UncorrectedVa
            | ComponentType::Keratometer
            | ComponentType::KeratometerFull
            | ComponentType::KeratometerContactLens
            | ComponentType::CornealTopography
            | ComponentType::CoverTest
            | ComponentType::Anamnesis
            | ComponentType::Notes
            | ComponentType::StereoTest
            | ComponentType::OcularMotorAssessment
            | ComponentType::SensationVisionStability
            | ComponentType::DiopterAdjustmentPanel
            | ComponentType::FusionRange
            | ComponentType::MaddoxRod
            | ComponentType::SchirmerTest
            | ComponentType::ContactLensDiameters
            | ComponentType::ContactLensOrder => &[],
        }
    }

    /// Types whose cards carry a user-editable title.
    pub fn supports_title(&self) -> bool {
        matches!(self, ComponentType::Notes | ComponentType::CornealTopography)
    }

    /// Types that may appear on several cards of one layout.
    ///
    /// Their data is keyed by card id (and tab id for cover tests) rather than
    /// by type alone.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, ComponentType::Notes | ComponentType::CoverTest)
    }

    /// Nominal card width as a percentage of a row, used when packing.
    pub fn nominal_width(&self) -> u32 {
        match self {
            ComponentType::OldRefractionExtension
            | ComponentType::FinalSubjective
            | ComponentType::FinalPrescription
            | ComponentType::ContactLensDetails
            | ComponentType::ContactLensExam
            | ComponentType::ContactLensOrder
            | ComponentType::FusionRange => 50,
            _ => 33,
        }
    }

    /// Look up a type by its slug.
    pub fn from_slug(slug: &str) -> Option<ComponentType> {
        ComponentType::ALL.iter().copied().find(|t| t.slug() == slug)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ComponentType {
    type Err = VistaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::from_slug(s).ok_or_else(|| VistaError::UnknownComponent(s.to_string()))
    }
}

/// Field schema for a slug; unknown slugs have an empty schema.
pub fn fields_for_slug(slug: &str) -> &'static [&'static str] {
    ComponentType::from_slug(slug)
        .map(|t| t.fields())
        .unwrap_or(&[])
}
