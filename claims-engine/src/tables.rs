// Reference tables consumed by the rule evaluator
//
// Tables are lists of records rather than code-keyed maps so that every
// configuration source (YAML, JSON, environment) preserves code casing.

use crate::models::ClaimRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisMapping {
    pub diagnosis_code: String,
    pub procedure_codes: Vec<String>,
}

/// Expected cost band for a procedure, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_code: Option<String>,
    pub min: Decimal,
    pub max: Decimal,
}

impl CostBand {
    pub fn contains(&self, cost: Decimal) -> bool {
        cost >= self.min && cost <= self.max
    }
}

/// A patient-age restriction on a diagnosis or procedure
///
/// Matches when the age bound holds and the claim carries one of the
/// listed diagnosis codes or one of the listed procedure codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeCondition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_below: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_above: Option<u8>,
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
    #[serde(default)]
    pub procedure_codes: Vec<String>,
}

impl AgeCondition {
    pub fn matches(&self, claim: &ClaimRecord) -> bool {
        let age_hit = self.age_below.map_or(true, |bound| claim.age < bound)
            && self.age_above.map_or(true, |bound| claim.age > bound);
        let code_hit = self.diagnosis_codes.iter().any(|c| *c == claim.diagnosis_code)
            || self.procedure_codes.iter().any(|c| *c == claim.procedure_code);
        age_hit && code_hit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTables {
    pub diagnosis_procedures: Vec<DiagnosisMapping>,
    pub cost_bands: Vec<CostBand>,
    /// Band used for procedures absent from `cost_bands`
    pub default_cost_band: CostBand,
    pub age_conditions: Vec<AgeCondition>,
}

impl ReferenceTables {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for mapping in &self.diagnosis_procedures {
            if !seen.insert(mapping.diagnosis_code.as_str()) {
                problems.push(format!(
                    "tables.diagnosis_procedures: {} listed twice",
                    mapping.diagnosis_code
                ));
            }
        }
        let mut banded = HashSet::new();
        for band in &self.cost_bands {
            match band.procedure_code.as_deref() {
                Some(code) if !banded.insert(code) => {
                    problems.push(format!("tables.cost_bands: {code} listed twice"));
                }
                Some(_) => {}
                None => problems.push("tables.cost_bands: band without a procedure code".to_string()),
            }
        }
        for band in self.cost_bands.iter().chain(std::iter::once(&self.default_cost_band)) {
            if band.min < Decimal::ZERO || band.min > band.max {
                problems.push(format!(
                    "tables.cost_bands: invalid band {}..{} for {}",
                    band.min,
                    band.max,
                    band.procedure_code.as_deref().unwrap_or("default")
                ));
            }
        }
        for condition in &self.age_conditions {
            if condition.age_below.is_none() && condition.age_above.is_none() {
                problems.push(format!("tables.age_conditions: {} has no age bound", condition.name));
            }
            if condition.diagnosis_codes.is_empty() && condition.procedure_codes.is_empty() {
                problems.push(format!("tables.age_conditions: {} names no codes", condition.name));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    pub(crate) fn compile(&self) -> CompiledTables {
        CompiledTables {
            mappings: self
                .diagnosis_procedures
                .iter()
                .map(|m| {
                    (
                        m.diagnosis_code.clone(),
                        m.procedure_codes.iter().cloned().collect(),
                    )
                })
                .collect(),
            bands: self
                .cost_bands
                .iter()
                .filter_map(|b| b.procedure_code.clone().map(|code| (code, b.clone())))
                .collect(),
            default_band: self.default_cost_band.clone(),
            age_conditions: self.age_conditions.clone(),
        }
    }
}

/// Hash-indexed form of [`ReferenceTables`]
#[derive(Debug, Clone)]
pub(crate) struct CompiledTables {
    pub mappings: HashMap<String, HashSet<String>>,
    pub bands: HashMap<String, CostBand>,
    pub default_band: CostBand,
    pub age_conditions: Vec<AgeCondition>,
}

impl CompiledTables {
    pub fn band_for(&self, procedure_code: &str) -> &CostBand {
        self.bands.get(procedure_code).unwrap_or(&self.default_band)
    }
}

const DIAGNOSIS_PROCEDURES: &[(&str, &[&str])] = &[
    ("E10", &["99213", "99214", "99215", "92004"]),
    ("E11", &["99213", "99214", "99215", "92004"]),
    ("I10", &["99213", "99214", "99215", "93000"]),
    ("J44", &["94002", "94010", "94060", "94664"]),
    ("F32", &["99204", "99205", "90834", "90837"]),
    ("M79", &["99213", "99214", "20610", "97110"]),
    ("E78", &["99213", "99214", "99215", "80053"]),
    ("K21", &["99213", "99214", "43235", "43239"]),
    ("N18", &["99213", "99214", "99215", "36145"]),
    ("R07", &["99213", "99214", "93000", "71020"]),
    ("J06", &["99213", "99214", "69210", "92002"]),
    ("N39", &["99213", "99214", "81000", "81001"]),
    ("M99", &["99213", "98941", "98942", "97110"]),
    ("E66", &["99213", "99214", "99215", "99217"]),
    ("F41", &["99204", "99205", "90834", "90836"]),
    ("Z79", &["99213", "99214", "99215", "90834"]),
    ("R06", &["99213", "99214", "94002", "94060"]),
    ("I39", &["99213", "99214", "99215", "93000"]),
    ("J20", &["99213", "99214", "71046", "71047"]),
    ("K59", &["99213", "99214", "99215", "74150"]),
];

const COST_BANDS: &[(&str, i64, i64)] = &[
    ("99213", 150, 500),
    ("99214", 200, 600),
    ("99215", 300, 800),
    ("92004", 200, 600),
    ("93000", 150, 400),
    ("94002", 100, 250),
    ("94010", 150, 350),
    ("94060", 100, 250),
    ("94664", 200, 500),
    ("90834", 150, 300),
    ("90837", 200, 400),
    ("20610", 300, 800),
    ("97110", 100, 300),
    ("43235", 400, 1000),
    ("43239", 500, 1200),
    ("36145", 200, 500),
    ("81000", 30, 200),
    ("81001", 50, 250),
    ("69210", 200, 500),
    ("92002", 150, 400),
    ("98941", 100, 200),
    ("98942", 150, 350),
    ("99217", 100, 300),
    ("90836", 200, 400),
    ("74150", 200, 600),
    ("71046", 150, 400),
    ("71047", 200, 500),
    ("80053", 50, 200),
];

impl Default for ReferenceTables {
    fn default() -> Self {
        let diagnosis_procedures = DIAGNOSIS_PROCEDURES
            .iter()
            .map(|(dx, procedures)| DiagnosisMapping {
                diagnosis_code: (*dx).to_string(),
                procedure_codes: procedures.iter().map(|p| (*p).to_string()).collect(),
            })
            .collect();
        let cost_bands = COST_BANDS
            .iter()
            .map(|(code, min, max)| CostBand {
                procedure_code: Some((*code).to_string()),
                min: Decimal::from(*min),
                max: Decimal::from(*max),
            })
            .collect();
        Self {
            diagnosis_procedures,
            cost_bands,
            default_cost_band: CostBand {
                procedure_code: None,
                min: Decimal::ZERO,
                max: Decimal::from(50_000),
            },
            age_conditions: vec![
                AgeCondition {
                    name: "type 1 diabetes in very young child".to_string(),
                    age_below: Some(5),
                    age_above: None,
                    diagnosis_codes: vec!["E10".to_string()],
                    procedure_codes: Vec::new(),
                },
                AgeCondition {
                    name: "invasive endoscopy in patient over 80".to_string(),
                    age_below: None,
                    age_above: Some(80),
                    diagnosis_codes: Vec::new(),
                    procedure_codes: vec!["43235".to_string(), "43239".to_string()],
                },
            ],
        }
    }
}

/// All procedure codes referenced by the default tables, sorted
pub fn default_procedure_codes() -> Vec<String> {
    let mut codes: Vec<String> = DIAGNOSIS_PROCEDURES
        .iter()
        .flat_map(|(_, procedures)| procedures.iter())
        .chain(COST_BANDS.iter().map(|(code, _, _)| code))
        .map(|c| (*c).to_string())
        .collect();
    codes.sort();
    codes.dedup();
    codes
}

/// All diagnosis codes in the default mapping table, in table order
pub fn default_diagnosis_codes() -> Vec<String> {
    DIAGNOSIS_PROCEDURES.iter().map(|(dx, _)| (*dx).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn claim(age: u8, dx: &str, px: &str) -> ClaimRecord {
        ClaimRecord {
            claim_id: "CLM1".into(),
            patient_id: "P0001".into(),
            age,
            gender: Gender::Male,
            diagnosis_code: dx.into(),
            procedure_code: px.into(),
            treatment_cost: dec!(200),
            insurance_coverage_limit: dec!(5000),
            claim_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            hospital_id: "H0001".into(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ReferenceTables::default().validate(), Ok(()));
    }

    #[test]
    fn band_lookup_falls_back_to_default() {
        let compiled = ReferenceTables::default().compile();
        assert_eq!(compiled.band_for("99213").max, dec!(500));
        assert_eq!(compiled.band_for("00000").max, dec!(50000));
    }

    #[test]
    fn age_conditions_match_on_bound_and_code() {
        let tables = ReferenceTables::default();
        let child = &tables.age_conditions[0];
        assert!(child.matches(&claim(3, "E10", "99213")));
        assert!(!child.matches(&claim(5, "E10", "99213")));
        assert!(!child.matches(&claim(3, "E11", "99213")));

        let elderly = &tables.age_conditions[1];
        assert!(elderly.matches(&claim(85, "K21", "43239")));
        assert!(!elderly.matches(&claim(80, "K21", "43239")));
    }

    #[test]
    fn rejects_inverted_band_and_duplicate_mapping() {
        let mut tables = ReferenceTables::default();
        tables.cost_bands[0].min = dec!(900);
        tables.diagnosis_procedures.push(tables.diagnosis_procedures[0].clone());
        let problems = tables.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn rejects_second_band_for_same_procedure() {
        let mut tables = ReferenceTables::default();
        let mut cheaper = tables.cost_bands[0].clone();
        cheaper.max = cheaper.min;
        tables.cost_bands.push(cheaper);
        let problems = tables.validate().unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("listed twice"), "{problems:?}");
    }

    #[test]
    fn default_code_lists() {
        let procedures = default_procedure_codes();
        assert!(procedures.contains(&"71020".to_string()));
        assert!(procedures.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(default_diagnosis_codes().len(), 20);
    }
}
