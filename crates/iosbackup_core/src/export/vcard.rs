//! vCard 3.0 export for contacts.

use super::{
    create_dir, sanitize_file_name, write_file, ExportResult, ExportSummary, UniqueNamer,
    DEFAULT_NAME_CHARS,
};
use crate::model::contact::Contact;
use log::{info, warn};
use std::path::Path;

const CRLF: &str = "\r\n";
const FOLD_OCTETS: usize = 75;

/// Renders one contact as a vCard 3.0 record, CRLF-terminated.
pub fn to_vcard(contact: &Contact) -> String {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!(
            "N:{};{};;;",
            escape_text(&contact.last_name),
            escape_text(&contact.first_name)
        ),
        format!("FN:{}", escape_text(&contact.full_name())),
    ];
    if !contact.organization.is_empty() {
        lines.push(format!("ORG:{}", escape_text(&contact.organization)));
    }
    for phone in &contact.phone_numbers {
        lines.push(format!("TEL;TYPE=CELL:{}", escape_text(phone)));
    }
    for email in &contact.emails {
        lines.push(format!("EMAIL:{}", escape_text(email)));
    }
    if !contact.note.is_empty() {
        lines.push(format!("NOTE:{}", escape_text(&contact.note)));
    }
    lines.push("END:VCARD".to_string());

    let mut card = lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join(CRLF);
    card.push_str(CRLF);
    card
}

/// Writes one `<display name>.vcf` per contact into `destination`.
pub fn export_contacts(contacts: &[Contact], destination: &Path) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();
    if contacts.is_empty() {
        return Ok(summary);
    }
    create_dir(destination)?;

    let mut namer = UniqueNamer::new();
    for contact in contacts {
        let stem = sanitize_file_name(&contact.display_name(), DEFAULT_NAME_CHARS, None);
        let target = destination.join(namer.claim(&format!("{stem}.vcf")));
        match write_file(&target, &to_vcard(contact)) {
            Ok(()) => summary.exported += 1,
            Err(err) => {
                warn!("event=export_vcard module=export status=failed error={err}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "event=export_vcard module=export status=ok exported={} failed={}",
        summary.exported, summary.failed
    );
    Ok(summary)
}

/// Writes every contact into one `.vcf` file; returns the number written.
///
/// No file is created for an empty list.
pub fn export_contacts_single(contacts: &[Contact], target: &Path) -> ExportResult<usize> {
    if contacts.is_empty() {
        return Ok(0);
    }
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir(parent)?;
    }
    let content: String = contacts.iter().map(to_vcard).collect();
    write_file(target, &content)?;
    info!(
        "event=export_vcard module=export status=ok mode=single count={}",
        contacts.len()
    );
    Ok(contacts.len())
}

/// Escapes a vCard text value: backslash, comma, semicolon and newlines.
/// Folds a content line at 75 octets, never inside a UTF-8 character.
///
/// Continuation lines start with one space, which counts toward the limit.
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / FOLD_OCTETS * 3);
    let mut width = 0;
    for ch in line.chars() {
        if width + ch.len_utf8() > FOLD_OCTETS {
            folded.push_str(CRLF);
            folded.push(' ');
            width = 1;
        }
        folded.push(ch);
        width += ch.len_utf8();
    }
    folded
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            }
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_text, fold_line, to_vcard};
    use crate::model::contact::Contact;

    #[test]
    fn vcard_lists_every_field_with_crlf() {
        let contact = Contact {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            organization: "Engines, Ltd".to_string(),
            phone_numbers: vec!["+44 20 7946 0000".to_string()],
            emails: vec!["ada@example.com".to_string()],
            note: "line one\nline two".to_string(),
        };
        assert_eq!(
            to_vcard(&contact),
            "BEGIN:VCARD\r\n\
             VERSION:3.0\r\n\
             N:Lovelace;Ada;;;\r\n\
             FN:Ada Lovelace\r\n\
             ORG:Engines\\, Ltd\r\n\
             TEL;TYPE=CELL:+44 20 7946 0000\r\n\
             EMAIL:ada@example.com\r\n\
             NOTE:line one\\nline two\r\n\
             END:VCARD\r\n"
        );
    }

    #[test]
    fn escaping_covers_structural_characters() {
        assert_eq!(escape_text(r"a\b;c,d"), r"a\\b\;c\,d");
        assert_eq!(escape_text("x\r\ny"), r"x\ny");
    }

    #[test]
    fn long_lines_fold_at_75_octets() {
        let note = format!("NOTE:{}", "a".repeat(200));
        let folded = fold_line(&note);
        let physical: Vec<&str> = folded.split("\r\n").collect();
        assert_eq!(physical.len(), 3);
        assert!(physical.iter().all(|line| line.len() <= 75));
        assert!(physical[1..].iter().all(|line| line.starts_with(' ')));
        assert_eq!(folded.replace("\r\n ", ""), note);

        let accented = "é".repeat(60);
        let folded = fold_line(&accented);
        assert!(folded.split("\r\n").all(|line| line.len() <= 75));
        assert_eq!(folded.replace("\r\n ", ""), accented);
        assert_eq!(fold_line("FN:Ada"), "FN:Ada");
    }
}
