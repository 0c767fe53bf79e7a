use serde::{Deserialize, Serialize};

use crate::error::DecisionError;

/// Macro to generate enum with as_str + std::str::FromStr + ALL pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DecisionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DecisionError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

str_enum!(Sex {
    Male => "male",
    Female => "female",
});

str_enum!(Ethnicity {
    AfricanAmerican => "african_american",
    CaucasianAmerican => "caucasian_american",
    EastAfrican => "east_african",
    HanChinese => "han_chinese",
    Hispanic => "hispanic",
    Hmong => "hmong",
    Korean => "korean",
    NativeAmerican => "native_american",
    Other => "other",
    PacificIslander => "pacific_islander",
    Thai => "thai",
});

impl Ethnicity {
    /// Populations with a high HLA-B*58:01 carrier rate.
    pub fn hlab5801_high_risk(&self) -> bool {
        matches!(
            self,
            Self::AfricanAmerican | Self::HanChinese | Self::Korean | Self::Thai
        )
    }
}

// ---------------------------------------------------------------------------
// Medical history
// ---------------------------------------------------------------------------

str_enum!(
    /// Each tag is a condition the patient has; absence means "does not have".
    MedHistoryType {
        Angina => "angina",
        Anticoagulation => "anticoagulation",
        Bleed => "bleed",
        Cad => "cad",
        Chf => "chf",
        Ckd => "ckd",
        ColchicineInteraction => "colchicine_interaction",
        Diabetes => "diabetes",
        Erosions => "erosions",
        GastricBypass => "gastric_bypass",
        Gout => "gout",
        HeartAttack => "heart_attack",
        Hepatitis => "hepatitis",
        Hypertension => "hypertension",
        Hyperuricemia => "hyperuricemia",
        Ibd => "ibd",
        Menopause => "menopause",
        OrganTransplant => "organ_transplant",
        Osteoporosis => "osteoporosis",
        Pud => "pud",
        Pvd => "pvd",
        Stroke => "stroke",
        Tophi => "tophi",
        UrateStones => "urate_stones",
        XoiInteraction => "xoi_interaction",
    }
);

impl MedHistoryType {
    /// Cardiovascular diseases that count together in scoring and contraindications.
    pub const CARDIOVASCULAR: &'static [Self] = &[
        Self::Angina,
        Self::Cad,
        Self::Chf,
        Self::HeartAttack,
        Self::Stroke,
        Self::Pvd,
    ];

    pub fn is_cardiovascular(&self) -> bool {
        Self::CARDIOVASCULAR.contains(self)
    }

    /// Readable name for rationale text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Angina => "angina",
            Self::Anticoagulation => "anticoagulation",
            Self::Bleed => "a history of bleeding",
            Self::Cad => "coronary artery disease",
            Self::Chf => "congestive heart failure",
            Self::Ckd => "chronic kidney disease",
            Self::ColchicineInteraction => "a colchicine drug interaction",
            Self::Diabetes => "diabetes",
            Self::Erosions => "gouty erosions",
            Self::GastricBypass => "gastric bypass",
            Self::Gout => "gout",
            Self::HeartAttack => "a prior heart attack",
            Self::Hepatitis => "hepatitis",
            Self::Hypertension => "hypertension",
            Self::Hyperuricemia => "hyperuricemia",
            Self::Ibd => "inflammatory bowel disease",
            Self::Menopause => "menopause",
            Self::OrganTransplant => "an organ transplant",
            Self::Osteoporosis => "osteoporosis",
            Self::Pud => "peptic ulcer disease",
            Self::Pvd => "peripheral vascular disease",
            Self::Stroke => "a prior stroke",
            Self::Tophi => "tophi",
            Self::UrateStones => "urate kidney stones",
            Self::XoiInteraction => "a xanthine oxidase inhibitor drug interaction",
        }
    }
}

str_enum!(
    /// CKD stage I (mild) through V (severe / dialysis).
    CkdStage {
        One => "1",
        Two => "2",
        Three => "3",
        Four => "4",
        Five => "5",
    }
);

impl CkdStage {
    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Five),
            _ => None,
        }
    }

    pub fn roman(&self) -> &'static str {
        match self {
            Self::One => "I",
            Self::Two => "II",
            Self::Three => "III",
            Self::Four => "IV",
            Self::Five => "V",
        }
    }
}

str_enum!(DialysisType {
    Hemodialysis => "hemodialysis",
    Peritoneal => "peritoneal",
});

str_enum!(DialysisDuration {
    LessThanSix => "less_than_six_months",
    LessThanYear => "less_than_a_year",
    MoreThanYear => "more_than_a_year",
});

// ---------------------------------------------------------------------------
// Labs
// ---------------------------------------------------------------------------

str_enum!(LabKind {
    Creatinine => "creatinine",
    Urate => "urate",
});

str_enum!(Trend {
    Improving => "improving",
    Worsening => "worsening",
    Stable => "stable",
    Unknown => "unknown",
});

// ---------------------------------------------------------------------------
// AKI
// ---------------------------------------------------------------------------

str_enum!(AkiStatus {
    None => "none",
    Ongoing => "ongoing",
    Improving => "improving",
    Resolved => "resolved",
});

// ---------------------------------------------------------------------------
// Flares
// ---------------------------------------------------------------------------

str_enum!(JointSite {
    Mtp1Right => "mtp1_right",
    Mtp1Left => "mtp1_left",
    RightFoot => "right_foot",
    LeftFoot => "left_foot",
    AnkleRight => "ankle_right",
    AnkleLeft => "ankle_left",
    KneeRight => "knee_right",
    KneeLeft => "knee_left",
    HipRight => "hip_right",
    HipLeft => "hip_left",
    RightHand => "right_hand",
    LeftHand => "left_hand",
    WristRight => "wrist_right",
    WristLeft => "wrist_left",
    ElbowRight => "elbow_right",
    ElbowLeft => "elbow_left",
    ShoulderRight => "shoulder_right",
    ShoulderLeft => "shoulder_left",
});

impl JointSite {
    pub fn is_mtp1(&self) -> bool {
        matches!(self, Self::Mtp1Right | Self::Mtp1Left)
    }

    /// Joints commonly involved in gout. Hips and shoulders are not.
    pub fn is_common_gout_joint(&self) -> bool {
        !matches!(
            self,
            Self::HipRight | Self::HipLeft | Self::ShoulderRight | Self::ShoulderLeft
        )
    }
}

str_enum!(Onset {
    Rapid => "rapid",
    Gradual => "gradual",
});

str_enum!(Likelihood {
    Unlikely => "unlikely",
    Equivocal => "equivocal",
    Likely => "likely",
});

str_enum!(Prevalence {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl Prevalence {
    /// Population prevalence of gout among patients in this bucket, percent.
    pub fn percent(&self) -> f64 {
        match self {
            Self::Low => 2.2,
            Self::Medium => 31.2,
            Self::High => 80.4,
        }
    }
}

str_enum!(
    /// Features that argue against a gout diagnosis for a flare.
    LessLikely {
        FemaleUnderSixty => "female_under_sixty",
        TooYoung => "too_young",
        TooLong => "too_long",
        TooShort => "too_short",
        JointsAtypical => "joints_atypical",
        CrystalsNegative => "crystals_negative",
    }
);

str_enum!(MoreLikely {
    CrystalsPositive => "crystals_positive",
});

// ---------------------------------------------------------------------------
// ULT
// ---------------------------------------------------------------------------

str_enum!(FlareNum {
    Zero => "zero",
    One => "one",
    TwoPlus => "two_plus",
});

str_enum!(FlareFreq {
    OneOrLess => "one_or_less",
    TwoOrMore => "two_or_more",
});

str_enum!(Indication {
    NotIndicated => "not_indicated",
    Conditional => "conditional",
    Indicated => "indicated",
});

// ---------------------------------------------------------------------------
// Treatments
// ---------------------------------------------------------------------------

str_enum!(Treatment {
    Allopurinol => "allopurinol",
    Celecoxib => "celecoxib",
    Colchicine => "colchicine",
    Diclofenac => "diclofenac",
    Febuxostat => "febuxostat",
    Ibuprofen => "ibuprofen",
    Indomethacin => "indomethacin",
    Meloxicam => "meloxicam",
    Methylprednisolone => "methylprednisolone",
    Naproxen => "naproxen",
    Prednisone => "prednisone",
    Probenecid => "probenecid",
});

str_enum!(TreatmentClass {
    Nsaid => "nsaid",
    Colchicine => "colchicine",
    Steroid => "steroid",
    Xoi => "xoi",
    Uricosuric => "uricosuric",
});

impl Treatment {
    pub fn class(&self) -> TreatmentClass {
        match self {
            Self::Celecoxib
            | Self::Diclofenac
            | Self::Ibuprofen
            | Self::Indomethacin
            | Self::Meloxicam
            | Self::Naproxen => TreatmentClass::Nsaid,
            Self::Colchicine => TreatmentClass::Colchicine,
            Self::Methylprednisolone | Self::Prednisone => TreatmentClass::Steroid,
            Self::Allopurinol | Self::Febuxostat => TreatmentClass::Xoi,
            Self::Probenecid => TreatmentClass::Uricosuric,
        }
    }

    pub fn is_nsaid(&self) -> bool {
        self.class() == TreatmentClass::Nsaid
    }

    pub fn is_steroid(&self) -> bool {
        self.class() == TreatmentClass::Steroid
    }

    /// Urate-lowering agents.
    pub fn is_ult(&self) -> bool {
        matches!(self.class(), TreatmentClass::Xoi | TreatmentClass::Uricosuric)
    }
}

str_enum!(
    /// Clinical context a treatment catalog is built for.
    TreatmentContext {
        Flare => "flare",
        Prophylaxis => "prophylaxis",
        Ult => "ult",
    }
);

str_enum!(AllergySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Anaphylaxis => "anaphylaxis",
});
