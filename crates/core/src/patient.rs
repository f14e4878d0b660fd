//! Patient record, input modes and form collection

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Ethnicity choices offered by the manual entry form
pub const ETHNICITY_OPTIONS: &[&str] = &[
    "Jawa",
    "Sunda",
    "Batak",
    "Minangkabau",
    "Bugis",
    "Melayu",
    "Madura",
    "Betawi",
    "Tionghoa-Indonesia",
    "Papua",
    "Lainnya",
];

/// Words in a diagnosis or observation that make glycemic control relevant
static GLYCEMIC_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(diabetes|diabetik|prediabetes|dm|dmt2|t2dm|glukosa|gula darah|hba1c|hiperglikemia|hipoglikemia|glikemik|glycemic|insulin|gdp|gds|gdpp)\b",
    )
    .expect("glycemic term pattern is valid")
});

/// A single patient as held in the store file or entered by hand.
///
/// Field names on the wire follow the BGSi data file (`nama`, `rsid_data`,
/// `kondisi_saat_ini`, ...). Optional text fields that are blank are read as
/// absent so the prompt renders them consistently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "nama", alias = "name")]
    pub name: String,

    #[serde(
        rename = "tb_bb",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub anthropometrics: Option<String>,

    #[serde(
        rename = "etnis",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethnicity: Option<String>,

    #[serde(
        rename = "usia",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<String>,

    #[serde(rename = "kondisi_saat_ini")]
    pub diagnosis: String,

    #[serde(
        rename = "obat",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub medication: Option<String>,

    #[serde(rename = "rsid_data")]
    pub rsid: String,

    #[serde(
        rename = "tambahan",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub observation: Option<String>,

    #[serde(
        rename = "fokus_nutrigenomik",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub nutrigenomic_focus: Option<String>,

    #[serde(
        rename = "keterangan_risiko",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_notes: Option<String>,
}

impl PatientRecord {
    /// Check the fixed required set: name and RSID markers
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.rsid.trim().is_empty() {
            return Err(ValidationError::MissingRsid);
        }
        Ok(())
    }

    /// Whether the diagnosis or latest observation mentions glycemic control
    pub fn is_glycemic_relevant(&self) -> bool {
        GLYCEMIC_TERMS.is_match(&self.diagnosis)
            || self
                .observation
                .as_deref()
                .is_some_and(|text| GLYCEMIC_TERMS.is_match(text))
    }
}

/// Where the patient data comes from. The two modes never combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Store,
    Manual,
}

impl InputMode {
    /// Label shown on the mode selector
    pub fn label(self) -> &'static str {
        match self {
            InputMode::Store => "Database BGSi",
            InputMode::Manual => "Input Manual Klinis",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Store => "store",
            InputMode::Manual => "manual",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw manual entry form, captured atomically on submit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub anthropometrics: String,
    #[serde(default)]
    pub ethnicity: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub rsid: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub observation: String,
}

impl ManualForm {
    /// Turn the form into a record, rejecting a blank name or RSID
    pub fn into_record(self) -> Result<PatientRecord, ValidationError> {
        let record = PatientRecord {
            name: self.name.trim().to_string(),
            anthropometrics: non_blank(&self.anthropometrics),
            ethnicity: non_blank(&self.ethnicity),
            age: non_blank(&self.age),
            diagnosis: self.diagnosis.trim().to_string(),
            medication: non_blank(&self.medication),
            rsid: self.rsid.trim().to_string(),
            observation: non_blank(&self.observation),
            nutrigenomic_focus: None,
            risk_notes: None,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Free-text fields layered over a stored record in store mode
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreOverrides {
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub observation: String,
}

impl StoreOverrides {
    /// Overwrite medication and observation; a blank override keeps the stored value
    pub fn apply_to(&self, mut record: PatientRecord) -> PatientRecord {
        if let Some(medication) = non_blank(&self.medication) {
            record.medication = Some(medication);
        }
        if let Some(observation) = non_blank(&self.observation) {
            record.observation = Some(observation);
        }
        record
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Accept a string or a number (e.g. `"usia": 52`), mapping blanks and null to `None`
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(text)) => Ok(non_blank(&text)),
        Some(serde_json::Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(diagnosis: &str, observation: Option<&str>) -> PatientRecord {
        PatientRecord {
            name: "Budi".to_string(),
            anthropometrics: None,
            ethnicity: None,
            age: None,
            diagnosis: diagnosis.to_string(),
            medication: None,
            rsid: "rs7903146".to_string(),
            observation: observation.map(str::to_string),
            nutrigenomic_focus: None,
            risk_notes: None,
        }
    }

    #[test]
    fn test_deserialize_store_entry() {
        let json = r#"{
            "nama": "Siti",
            "tb_bb": "155cm / 68kg",
            "usia": 52,
            "etnis": "Jawa",
            "rsid_data": "rs4149056",
            "kondisi_saat_ini": "Type 2 Diabetes",
            "keterangan_risiko": ""
        }"#;
        let patient: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(patient.name, "Siti");
        assert_eq!(patient.age.as_deref(), Some("52"));
        assert_eq!(patient.ethnicity.as_deref(), Some("Jawa"));
        assert_eq!(patient.risk_notes, None);
        assert_eq!(patient.medication, None);
    }

    #[test]
    fn test_deserialize_accepts_name_alias() {
        let json = r#"{"name": "Ahmad", "rsid_data": "rs1801133", "kondisi_saat_ini": "Hipertensi"}"#;
        let patient: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(patient.name, "Ahmad");
    }

    #[test]
    fn test_deserialize_rejects_missing_rsid() {
        let json = r#"{"nama": "Ahmad", "kondisi_saat_ini": "Hipertensi"}"#;
        assert!(serde_json::from_str::<PatientRecord>(json).is_err());
    }

    #[test]
    fn test_manual_form_requires_name_and_rsid() {
        let form = ManualForm {
            name: "  ".to_string(),
            rsid: "rs4149056".to_string(),
            ..Default::default()
        };
        assert_eq!(form.into_record(), Err(ValidationError::MissingName));

        let form = ManualForm {
            name: "Siti".to_string(),
            rsid: "".to_string(),
            ..Default::default()
        };
        assert_eq!(form.into_record(), Err(ValidationError::MissingRsid));
    }

    #[test]
    fn test_manual_form_normalizes_blanks() {
        let form = ManualForm {
            name: " Siti ".to_string(),
            rsid: "rs4149056".to_string(),
            diagnosis: "Type 2 Diabetes".to_string(),
            medication: "   ".to_string(),
            observation: "TD 140/90".to_string(),
            ..Default::default()
        };
        let patient = form.into_record().unwrap();
        assert_eq!(patient.name, "Siti");
        assert_eq!(patient.medication, None);
        assert_eq!(patient.observation.as_deref(), Some("TD 140/90"));
    }

    #[test]
    fn test_overrides_replace_only_filled_fields() {
        let mut stored = record("Hipertensi", Some("Pusing pagi hari"));
        stored.medication = Some("Amlodipine 5mg".to_string());

        let overrides = StoreOverrides {
            medication: "Simvastatin 20mg".to_string(),
            observation: String::new(),
        };
        let effective = overrides.apply_to(stored);
        assert_eq!(effective.medication.as_deref(), Some("Simvastatin 20mg"));
        assert_eq!(effective.observation.as_deref(), Some("Pusing pagi hari"));
    }

    #[test]
    fn test_glycemic_relevance() {
        assert!(record("Type 2 Diabetes", None).is_glycemic_relevant());
        assert!(record("Hipertensi", Some("Gula darah puasa 180")).is_glycemic_relevant());
        assert!(record("DM tipe 2", None).is_glycemic_relevant());
        assert!(!record("Hipertensi", Some("Nyeri kepala")).is_glycemic_relevant());
        // "dm" must be a whole word
        assert!(!record("Admisi ulang", None).is_glycemic_relevant());
    }
}
