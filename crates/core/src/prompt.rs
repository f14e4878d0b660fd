//! Clinical analysis prompt for the completion service

use std::fmt::Write;

use crate::patient::PatientRecord;

pub const SECTION_DIAGNOSIS: &str = "1. DIAGNOSIS KERJA & PROBABILITAS";
pub const SECTION_PHARMACOGENOMICS: &str = "2. EVALUASI FARMAKOGENOMIK";
pub const SECTION_NUTRIGENOMICS: &str = "3. RENCANA NUTRIGENOMIK";
pub const SECTION_PROGNOSIS: &str = "4. PROGNOSIS KLINIS";

/// Closed recommendation set for the pharmacogenomic section:
/// continue, adjust dosage, switch medication
pub const RECOMMENDATIONS: [&str; 3] = ["LANJUTKAN", "SESUAIKAN DOSIS", "GANTI OBAT"];

/// Only added when the record mentions glycemic control
pub const SUGAR_SOURCE_CLAUSE: &str =
    "Bila kontrol glikemik relevan, rekomendasikan gula merah atau tebu kuning sebagai sumber pemanis pengganti gula pasir beserta batas porsinya.";

const PREAMBLE: &str = "Anda adalah IndoGen-AI, sistem pendukung keputusan klinis berbasis genomik.";

const NOT_AVAILABLE: &str = "N/A";
const NONE_REPORTED: &str = "Tidak ada";

/// Render a patient record into the fixed four-section instruction.
///
/// Pure: the same record always yields the same bytes. Optional identity
/// fields (age, ethnicity, focus, risk notes) are left out entirely when
/// absent; clinical fields print a placeholder instead so the generator sees
/// that they were considered.
pub fn build(record: &PatientRecord) -> String {
    let mut prompt = String::new();

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nDATA PASIEN:\n");
    push_line(&mut prompt, "Nama", Some(record.name.trim()));
    push_line(&mut prompt, "Usia", record.age.as_deref());
    push_line(&mut prompt, "Etnis", record.ethnicity.as_deref());
    push_line(
        &mut prompt,
        "Antropometri/Vital",
        Some(record.anthropometrics.as_deref().unwrap_or(NOT_AVAILABLE)),
    );
    push_line(
        &mut prompt,
        "Diagnosis Saat Ini",
        Some(non_empty(&record.diagnosis).unwrap_or(NOT_AVAILABLE)),
    );
    push_line(
        &mut prompt,
        "Resep Obat Aktif",
        Some(record.medication.as_deref().unwrap_or(NONE_REPORTED)),
    );
    push_line(&mut prompt, "Profil Genetik (RSID)", Some(record.rsid.trim()));
    push_line(
        &mut prompt,
        "Observasi Klinis Terbaru",
        Some(record.observation.as_deref().unwrap_or(NONE_REPORTED)),
    );
    push_line(
        &mut prompt,
        "Fokus Nutrigenomik",
        record.nutrigenomic_focus.as_deref(),
    );
    push_line(&mut prompt, "Keterangan Risiko", record.risk_notes.as_deref());

    prompt.push_str("\nTUGAS ANALISIS (POIN-POIN):\n");

    let _ = writeln!(
        prompt,
        "{SECTION_DIAGNOSIS}: Berikan kemungkinan penyakit beserta persentase probabilitas (%) masing-masing."
    );

    let medication = match record.medication.as_deref() {
        Some(medication) => format!("obat {medication}"),
        None => "obat yang umum diresepkan untuk diagnosis tersebut".to_string(),
    };
    let _ = writeln!(
        prompt,
        "{SECTION_PHARMACOGENOMICS}: Evaluasi efektivitas dan keamanan {medication} terhadap marker RSID pasien. Tutup dengan tepat satu rekomendasi: {}, {}, atau {}.",
        RECOMMENDATIONS[0], RECOMMENDATIONS[1], RECOMMENDATIONS[2]
    );

    let _ = write!(
        prompt,
        "{SECTION_NUTRIGENOMICS}: Susun rencana diet berbasis profil genetik."
    );
    if let Some(ethnicity) = record.ethnicity.as_deref() {
        let _ = write!(
            prompt,
            " Sesuaikan dengan pola makan tradisional etnis {ethnicity} dan bahan pangan lokal yang mudah didapat."
        );
    }
    if record.is_glycemic_relevant() {
        prompt.push(' ');
        prompt.push_str(SUGAR_SOURCE_CLAUSE);
    }
    prompt.push('\n');

    let _ = writeln!(
        prompt,
        "{SECTION_PROGNOSIS}: Uraikan risiko jangka panjang berdasarkan data fisik dan genetik."
    );

    prompt.push_str(
        "\nGAYA PENULISAN:\nGunakan Bahasa Indonesia medis formal. Akhiri laporan dengan daftar pustaka bernomor berformat Vancouver, tetapi jangan menyebutkan nama format sitasi tersebut di dalam laporan.\n",
    );

    prompt
}

fn push_line(prompt: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.and_then(non_empty) {
        let _ = writeln!(prompt, "- {label}: {value}");
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
