//! The report record and the free-text form parser.

use serde::{Deserialize, Serialize};

/// Project title printed in the header when the form does not carry
/// one.
pub const DEFAULT_PROJECT_TITLE: &str =
    "FETİHTEPE MERKEZ CAMİ'İ GÜÇLENDİRME VE YENİLEME PROJESİ";

/// One daily activity report. Constructed by the request layer,
/// passed once into the composer and discarded after the document is
/// finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Display-formatted date, e.g. "21.03.2025".
    pub date: String,
    pub report_number: String,
    /// Completed-work descriptions, bullet-free; the composer adds
    /// the bullets.
    pub work_items: Vec<String>,
    pub project_title: String,
}

/// Fold a form line for section-header matching: Turkish letters are
/// ASCII-folded, colons dropped, the rest lowercased.
fn normalize(line: &str) -> String {
    line.chars()
        .filter_map(|c| match c {
            'ı' | 'İ' => Some('i'),
            'ğ' | 'Ğ' => Some('g'),
            'ü' | 'Ü' => Some('u'),
            'ş' | 'Ş' => Some('s'),
            'ö' | 'Ö' => Some('o'),
            'ç' | 'Ç' => Some('c'),
            ':' | '\u{307}' => None,
            _ => Some(c.to_ascii_lowercase()),
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    ReportNumber,
    Date,
    WorkItems,
    ProjectTitle,
}

/// Parse the line-based form text into a record.
///
/// Section headers (`RAPOR NO`, `TARİH`, `YAPILAN İŞLER`, `PROJE`)
/// switch the current section; work items are the lines starting with
/// `-`. A missing date defaults to today.
pub fn parse_report_text(text: &str) -> ReportRecord {
    let mut record = ReportRecord {
        date: String::new(),
        report_number: String::new(),
        work_items: Vec::new(),
        project_title: DEFAULT_PROJECT_TITLE.to_string(),
    };
    let mut section = Section::None;
    let mut title_set = false;

    for raw in text.lines() {
        let raw = raw.trim();
        match normalize(raw).as_str() {
            "rapor_no" | "rapor no" => {
                section = Section::ReportNumber;
                continue;
            }
            "tarih" | "tarih_no" => {
                section = Section::Date;
                continue;
            }
            "yapilan_isler" | "yapilan isler" | "yapilan_is" => {
                section = Section::WorkItems;
                continue;
            }
            "proje" | "proje_basligi" | "proje basligi" => {
                section = Section::ProjectTitle;
                continue;
            }
            _ => {}
        }

        match section {
            Section::ReportNumber if record.report_number.is_empty() => {
                record.report_number = raw.to_string();
            }
            Section::Date if record.date.is_empty() => {
                record.date = raw.to_string();
            }
            Section::WorkItems => {
                if let Some(item) = raw.strip_prefix('-') {
                    record.work_items.push(item.trim().to_string());
                }
            }
            Section::ProjectTitle if !title_set && !raw.is_empty() => {
                record.project_title = raw.to_string();
                title_set = true;
            }
            _ => {}
        }
    }

    if record.date.is_empty() {
        record.date = chrono::Local::now().format("%d.%m.%Y").to_string();
    }

    record
}

/// Strip a display date down to digits and dots for use in file
/// names.
pub fn safe_date(date: &str) -> String {
    date.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}
