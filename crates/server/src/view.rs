//! HTML rendering for the dashboard

use std::fmt::Write;

use axum::http::StatusCode;
use indogen_core::{
    ConfigError, DataSourceError, ETHNICITY_OPTIONS, InputMode, PatientRecord, Phase, SessionState,
};

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: #1e293b; background: #f8fafc; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 340px; padding: 24px; background: #eef2f7; border-right: 1px solid #e2e8f0; }
.main { flex: 1; padding: 32px 48px; }
label { display: block; margin-top: 12px; font-size: 0.9em; font-weight: 600; }
input, textarea, select { width: 100%; box-sizing: border-box; padding: 8px; margin-top: 4px; border: 1px solid #cbd5e1; border-radius: 6px; font: inherit; }
button { margin-top: 16px; width: 100%; padding: 10px; border: 0; border-radius: 6px; background: #1d4ed8; color: #fff; font-weight: 600; cursor: pointer; }
button.secondary { background: #fff; color: #1d4ed8; border: 1px solid #1d4ed8; }
button[disabled] { cursor: not-allowed !important; opacity: 0.6; }
.modes { display: flex; gap: 8px; }
.modes button { margin-top: 8px; }
.report-card { background-color: #ffffff; padding: 35px; border-radius: 10px; border: 1px solid #e2e8f0; box-shadow: 0 4px 6px -1px rgb(0 0 0 / 0.1); color: #1e293b; line-height: 1.8; white-space: pre-wrap; }
.patient-header { background-color: #f1f5f9; padding: 20px; border-radius: 8px; border-left: 6px solid #1d4ed8; margin: 16px 0 25px; }
.notice { padding: 14px 18px; border-radius: 8px; margin-bottom: 18px; }
.notice.info { background: #e0f2fe; }
.notice.warning { background: #fef9c3; }
.notice.error { background: #fee2e2; }
.actions { display: flex; gap: 12px; align-items: center; }
.actions form, .actions a { flex: 0 0 auto; }
.actions button { width: auto; padding: 10px 18px; }
"#;

/// Disable the pressed button while the request is in flight
const DISABLE_ON_SUBMIT: &str =
    r#"onsubmit="this.querySelectorAll('button').forEach(function(b){b.disabled=true;})""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    fn class(self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// Inline message shown above the main panel for one render
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything one dashboard render needs
pub struct DashboardView<'a> {
    pub session: &'a SessionState,
    pub patients: &'a Result<Vec<String>, DataSourceError>,
    pub preview: Option<&'a PatientRecord>,
    pub notice: Option<&'a Notice>,
    pub config_error: Option<&'a ConfigError>,
}

pub fn dashboard(view: &DashboardView<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>IndoGen-AI | Clinical Dashboard</title>
    <style>{STYLE}</style>
</head>
<body>
<div class="layout">
<aside class="sidebar">
    <h2>&#x1FA7A; Rekam Medis &amp; Genomik</h2>
{sidebar}
</aside>
<main class="main">
    <h1>IndoGen-AI: Dashboard Intervensi Klinis</h1>
{main}
</main>
</div>
</body>
</html>"#,
        sidebar = sidebar(view),
        main = main_panel(view),
    )
}

fn sidebar(view: &DashboardView<'_>) -> String {
    let mode = view.session.mode();
    let locked = disabled_attr(view.session.is_processing());

    let mut html = String::from(
        r#"    <form method="post" action="/mode">
        <label>Pilih Sumber Data:</label>
        <div class="modes">"#,
    );
    for option in [InputMode::Store, InputMode::Manual] {
        let class = if option == mode { "" } else { r#" class="secondary""# };
        let _ = write!(
            html,
            r#"<button type="submit" name="mode" value="{}"{class}{locked}>{}</button>"#,
            option.as_str(),
            option.label()
        );
    }
    html.push_str("</div>\n    </form>\n");

    match mode {
        InputMode::Store => html.push_str(&store_panel(view)),
        InputMode::Manual => html.push_str(&manual_form(view)),
    }
    html
}

fn store_panel(view: &DashboardView<'_>) -> String {
    let names = match view.patients {
        Ok(names) => names,
        Err(e) => {
            return format!(
                r#"    <div class="notice error">Database JSON tidak dapat dimuat: {}</div>
"#,
                escape(&e.to_string())
            );
        }
    };

    let selected = view.preview.map(|p| p.name.as_str());
    let options: String = names
        .iter()
        .map(|name| {
            let sel = if Some(name.as_str()) == selected { " selected" } else { "" };
            format!(
                r#"<option value="{0}"{sel}>{0}</option>"#,
                escape(name)
            )
        })
        .collect();

    let mut html = format!(
        r#"    <form method="get" action="/">
        <label for="patient">Pilih Profil Pasien:</label>
        <select id="patient" name="patient" onchange="this.form.submit()">{options}</select>
    </form>
    <p><a href="/?random=1">Pilih pasien acak</a></p>
"#
    );

    let Some(patient) = view.preview else {
        html.push_str(r#"    <div class="notice info">Database pasien kosong.</div>"#);
        return html;
    };

    let _ = write!(
        html,
        r#"    <div class="patient-header">
        <b>Identitas:</b> {}<br>
        <b>Antropometri:</b> {}<br>
        <b>Diagnosis Awal:</b> {}
    </div>
    <form method="post" action="/submit/stored" {DISABLE_ON_SUBMIT}>
        <input type="hidden" name="patient" value="{}">
        <label for="medication">Resep Obat Aktif:</label>
        <input id="medication" name="medication" placeholder="Misal: Metformin 500mg...">
        <label for="observation">Observasi Klinis Terbaru:</label>
        <textarea id="observation" name="observation" placeholder="Keluhan tambahan atau TD..."></textarea>
        <button type="submit"{}>Proses Analisis Klinis</button>
    </form>
"#,
        escape(&patient.name),
        escape(patient.anthropometrics.as_deref().unwrap_or("N/A")),
        escape(&patient.diagnosis),
        escape(&patient.name),
        disabled_attr(view.session.is_processing() || view.config_error.is_some()),
    );
    html
}

fn manual_form(view: &DashboardView<'_>) -> String {
    let ethnicities: String = ETHNICITY_OPTIONS
        .iter()
        .map(|e| format!(r#"<option value="{0}">{0}</option>"#, escape(e)))
        .collect();

    format!(
        r#"    <form method="post" action="/submit/manual" {DISABLE_ON_SUBMIT}>
        <h3>Form Input Klinis</h3>
        <label for="name">Nama Lengkap</label>
        <input id="name" name="name">
        <label for="age">Usia</label>
        <input id="age" name="age">
        <label for="ethnicity">Etnis</label>
        <select id="ethnicity" name="ethnicity"><option value="">-</option>{ethnicities}</select>
        <label for="anthropometrics">Antropometri (TB/BB/TD)</label>
        <input id="anthropometrics" name="anthropometrics">
        <label for="rsid">Profil Genetik (RSID)</label>
        <textarea id="rsid" name="rsid"></textarea>
        <label for="diagnosis">Diagnosis Saat Ini</label>
        <textarea id="diagnosis" name="diagnosis"></textarea>
        <label for="medication">Resep Obat</label>
        <input id="medication" name="medication">
        <label for="observation">Keluhan/Observasi Baru</label>
        <textarea id="observation" name="observation"></textarea>
        <button type="submit"{}>Simpan &amp; Analisis Sekarang</button>
    </form>
"#,
        disabled_attr(view.session.is_processing() || view.config_error.is_some()),
    )
}

fn main_panel(view: &DashboardView<'_>) -> String {
    let session = view.session;
    let mut html = String::new();

    if let Some(err) = view.config_error {
        push_notice(
            &mut html,
            NoticeLevel::Error,
            &format!("Sistem gagal memverifikasi kredensial API. {err}"),
        );
    }
    if let Some(notice) = view.notice {
        push_notice(&mut html, notice.level, &notice.message);
    }

    match session.phase() {
        Phase::Processing => push_notice(
            &mut html,
            NoticeLevel::Info,
            "IndoGen-AI: Menganalisis parameter klinis...",
        ),
        Phase::Failed => {
            if let Some(failure) = session.failure() {
                push_notice(
                    &mut html,
                    NoticeLevel::Error,
                    &format!("Sistem AI Sibuk: {failure}"),
                );
            }
        }
        _ => {}
    }

    if let Some(report) = session.report() {
        let _ = write!(
            html,
            r#"    <div class="report-card">{}</div>
    <hr>
"#,
            escape(report.as_str())
        );
    } else if session.phase() != Phase::Processing {
        push_notice(
            &mut html,
            NoticeLevel::Info,
            "Sistem siap. Silakan lengkapi parameter klinis di sidebar untuk memulai.",
        );
    }

    html.push_str(&actions(view));
    html
}

fn actions(view: &DashboardView<'_>) -> String {
    let session = view.session;
    let mut html = String::from("    <div class=\"actions\">\n");

    if session.record().is_some() && session.phase() != Phase::Submitted {
        let label = match session.phase() {
            Phase::Failed => "Coba Lagi Analisis",
            _ => "Analisis Ulang",
        };
        let _ = writeln!(
            html,
            r#"        <form method="post" action="/analysis" {DISABLE_ON_SUBMIT}><button type="submit"{}>{label}</button></form>"#,
            disabled_attr(!session.can_trigger() || view.config_error.is_some()),
        );
    }
    if session.report().is_some() {
        html.push_str(
            "        <a href=\"/report/download\"><button type=\"button\" class=\"secondary\">Unduh Laporan (.txt)</button></a>\n",
        );
    }
    if matches!(session.phase(), Phase::ReportReady | Phase::Failed) {
        html.push_str(
            "        <form method=\"post\" action=\"/reset\"><button type=\"submit\">Selesai &amp; Reset Dashboard</button></form>\n",
        );
    }

    html.push_str("    </div>\n");
    html
}

/// Minimal standalone page for errors outside the dashboard flow
pub fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head><meta charset="UTF-8"><title>IndoGen-AI | {status}</title><style>{STYLE}</style></head>
<body><main class="main">
    <h1>{status}</h1>
    <div class="notice error">{message}</div>
    <p><a href="/">Kembali ke dashboard</a></p>
</main></body>
</html>"#,
        status = status,
        message = escape(message),
    )
}

fn push_notice(html: &mut String, level: NoticeLevel, message: &str) {
    let _ = writeln!(
        html,
        r#"    <div class="notice {}">{}</div>"#,
        level.class(),
        escape(message)
    );
}

fn disabled_attr(disabled: bool) -> &'static str {
    if disabled { " disabled" } else { "" }
}

/// Escape text for HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
