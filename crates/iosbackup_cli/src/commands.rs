//! Command handlers. Each one prints either aligned text rows or one JSON
//! document of the form `{"ok": true, "data": ...}`.

use crate::cli::{Cli, Commands, KindArg};
use anyhow::{bail, Context};
use iosbackup_core::export::call_log::export_calls_csv;
use iosbackup_core::export::media::export_camera_roll;
use iosbackup_core::export::transcript::{export_chats, export_notes};
use iosbackup_core::export::vcard::{export_contacts, export_contacts_single};
use iosbackup_core::format::{
    format_call_duration, format_datetime, format_file_size, format_total_duration,
    DATETIME_MINUTES_FORMAT,
};
use iosbackup_core::{
    list_available_backups, BackupInfo, BackupSession, CallStats, Category, ContactStats,
    DomainCount, ExplorerConfig, ExportProgress, ExportSummary, MediaStats, MessageStats, Mode,
    NoteStats,
};
use log::info;
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

const CONTACTS_FILE_NAME: &str = "contacts.vcf";
const CALLS_FILE_NAME: &str = "call_history.csv";

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct InfoOut<'a> {
    #[serde(flatten)]
    info: &'a BackupInfo,
    display_name: String,
    file_count: u64,
}

#[derive(Serialize)]
struct StatsOut {
    mode: Mode,
    file_count: u64,
    domains: Vec<DomainCount>,
    camera_roll: Option<MediaStats>,
    contacts: Option<ContactStats>,
    messages: Option<MessageStats>,
    notes: Option<NoteStats>,
    call_history: Option<CallStats>,
}

#[derive(Serialize)]
struct CategoryOut {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    pro_only: bool,
}

#[derive(Serialize)]
struct ExportOut {
    category: Category,
    destination: PathBuf,
    #[serde(flatten)]
    summary: ExportSummary,
}

pub fn run(cli: &Cli, config: &ExplorerConfig) -> anyhow::Result<()> {
    let json = cli.json;
    match &cli.command {
        Commands::List => {
            let backups = list_available_backups(&config.backup_root).with_context(|| {
                format!("failed to scan {}", config.backup_root.display())
            })?;
            print_out(json, &backups, |summary| {
                format!(
                    "{}\t{}\t{}\t{}",
                    summary.device.udid,
                    summary.device.device_name,
                    summary.device.product_version,
                    format_datetime(summary.device.last_backup_date, DATETIME_MINUTES_FORMAT)
                )
            })
        }
        Commands::Info { backup } => {
            let session = open_session(config, backup)?;
            let info = session.info();
            let out = InfoOut {
                info,
                display_name: info.display_name(),
                file_count: session.total_file_count()?,
            };
            print_one(json, out, |out| {
                let device = &out.info.device;
                [
                    format!("name: {}", out.display_name),
                    format!("model: {}", device.product_type),
                    format!("ios: {}", device.product_version),
                    format!("serial: {}", device.serial_number),
                    format!("udid: {}", device.udid),
                    format!(
                        "last backup: {}",
                        format_datetime(device.last_backup_date, DATETIME_MINUTES_FORMAT)
                    ),
                    format!("files: {}", out.file_count),
                    format!("path: {}", out.info.path.display()),
                ]
                .join("\n")
            })
        }
        Commands::Stats { backup } => {
            let session = open_session(config, backup)?;
            let stats = collect_stats(&session, config.mode)?;
            print_one(json, stats, stats_text)
        }
        Commands::Files {
            backup,
            domain,
            pattern,
        } => {
            let session = open_session(config, backup)?;
            let files = match pattern {
                Some(pattern) => session.files_matching(domain, pattern)?,
                None => session.files_in_domain(domain)?,
            };
            print_out(json, &files, |file| {
                format!(
                    "{}\t{}\t{}",
                    file.file_id,
                    format_file_size(file.size),
                    file.relative_path
                )
            })
        }
        Commands::Resolve {
            backup,
            domain,
            path,
        } => {
            let session = open_session(config, backup)?;
            let Some(blob) = session.resolve(domain, path)? else {
                bail!("no blob for {domain}:{path} in this backup");
            };
            print_one(json, blob, |blob| blob.display().to_string())
        }
        Commands::Categories => {
            let categories: Vec<CategoryOut> = config
                .mode
                .categories()
                .into_iter()
                .map(|category| CategoryOut {
                    key: category.key(),
                    name: category.name(),
                    description: category.description(),
                    pro_only: category.pro_only(),
                })
                .collect();
            print_out(json, &categories, |category| {
                format!("{}\t{}", category.key, category.description)
            })
        }
        Commands::Show {
            backup,
            category,
            limit,
        } => {
            config.mode.ensure_allows(*category)?;
            let session = open_session(config, backup)?;
            show_category(json, &session, *category, *limit)
        }
        Commands::Export {
            backup,
            category,
            out,
            kind,
            single_file,
        } => {
            config.mode.ensure_allows(*category)?;
            if kind.is_some() && *category != Category::CameraRoll {
                bail!("--kind only applies to camera_roll");
            }
            if *single_file && *category != Category::Contacts {
                bail!("--single-file only applies to contacts");
            }
            let session = open_session(config, backup)?;
            let destination = out
                .clone()
                .unwrap_or_else(|| config.export_dir.join(category.name()));
            let summary =
                export_category(&session, *category, &destination, *kind, *single_file, json)?;
            info!(
                "event=cli_export module=cli status=ok category={} exported={}",
                category, summary.exported
            );
            print_one(
                json,
                ExportOut {
                    category: *category,
                    destination,
                    summary,
                },
                |out| {
                    format!(
                        "exported {} (skipped {}, failed {}) to {}",
                        out.summary.exported,
                        out.summary.skipped,
                        out.summary.failed,
                        out.destination.display()
                    )
                },
            )
        }
    }
}

/// Accepts a backup folder path, or a folder name under the backup root.
fn open_session(config: &ExplorerConfig, backup: &str) -> anyhow::Result<BackupSession> {
    let direct = Path::new(backup);
    let path = if direct.is_dir() {
        direct.to_path_buf()
    } else {
        config.backup_root.join(backup)
    };
    BackupSession::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

fn collect_stats(session: &BackupSession, mode: Mode) -> anyhow::Result<StatsOut> {
    Ok(StatsOut {
        mode,
        file_count: session.total_file_count()?,
        domains: session.domain_stats()?,
        camera_roll: Some(session.camera_roll().stats()?),
        contacts: gated(mode, Category::Contacts, || session.contacts().stats())?,
        messages: gated(mode, Category::Messages, || session.messages().stats())?,
        notes: gated(mode, Category::Notes, || session.notes().stats())?,
        call_history: gated(mode, Category::CallHistory, || {
            session.call_history().stats()
        })?,
    })
}

fn gated<T, E>(
    mode: Mode,
    category: Category,
    load: impl FnOnce() -> Result<T, E>,
) -> Result<Option<T>, E> {
    if mode.allows(category) {
        load().map(Some)
    } else {
        Ok(None)
    }
}

fn stats_text(stats: &StatsOut) -> String {
    let mut lines = vec![
        format!("mode: {}", stats.mode),
        format!("files: {}", stats.file_count),
    ];
    if let Some(media) = stats.camera_roll {
        lines.push(format!(
            "camera roll: {} photos ({}), {} videos ({})",
            media.photo_count,
            format_file_size(media.photo_size),
            media.video_count,
            format_file_size(media.video_size)
        ));
    }
    if let Some(contacts) = stats.contacts {
        lines.push(format!(
            "contacts: {} ({} with phone, {} with email)",
            contacts.total_count, contacts.with_phones, contacts.with_emails
        ));
    }
    if let Some(messages) = stats.messages {
        lines.push(format!(
            "messages: {} in {} chats ({} iMessage, {} SMS)",
            messages.message_count, messages.chat_count, messages.imessage_count, messages.sms_count
        ));
    }
    if let Some(notes) = stats.notes {
        lines.push(format!(
            "notes: {} ({} words)",
            notes.note_count, notes.total_words
        ));
    }
    if let Some(calls) = stats.call_history {
        lines.push(format!(
            "calls: {} ({} incoming, {} outgoing, {} missed), {}",
            calls.total_calls,
            calls.incoming,
            calls.outgoing,
            calls.missed,
            format_total_duration(calls.total_duration_secs)
        ));
    }
    lines.push("domains:".to_string());
    for domain in &stats.domains {
        lines.push(format!("  {}\t{}", domain.count, domain.domain));
    }
    lines.join("\n")
}

fn show_category(
    json: bool,
    session: &BackupSession,
    category: Category,
    limit: usize,
) -> anyhow::Result<()> {
    match category {
        Category::CameraRoll => {
            let mut media = session.camera_roll().all_media()?;
            media.truncate(limit);
            print_out(json, &media, |file| {
                format!(
                    "{}\t{}\t{}",
                    format_datetime(file.modified(), DATETIME_MINUTES_FORMAT),
                    format_file_size(file.size()),
                    file.original_path()
                )
            })
        }
        Category::Contacts => {
            let mut contacts = session.contacts().contacts()?;
            contacts.truncate(limit);
            print_out(json, &contacts, |contact| {
                format!(
                    "{}\t{}\t{}",
                    contact.display_name(),
                    contact.primary_phone().unwrap_or(""),
                    contact.primary_email().unwrap_or("")
                )
            })
        }
        Category::Messages => {
            let mut chats = session.messages().chats()?;
            chats.truncate(limit);
            print_out(json, &chats, |chat| {
                format!(
                    "{}\t{}\t{}\t{}",
                    format_datetime(chat.last_message_date, DATETIME_MINUTES_FORMAT),
                    chat.message_count(),
                    chat.display_name,
                    chat.preview().replace('\n', " ")
                )
            })
        }
        Category::Notes => {
            let mut notes = session.notes().notes()?;
            notes.truncate(limit);
            print_out(json, &notes, |note| {
                format!(
                    "{}\t{}\t{}",
                    format_datetime(note.modified, DATETIME_MINUTES_FORMAT),
                    note.folder,
                    note.title
                )
            })
        }
        Category::CallHistory => {
            let mut calls = session.call_history().calls()?;
            calls.truncate(limit);
            print_out(json, &calls, |call| {
                format!(
                    "{}\t{}\t{}\t{}",
                    format_datetime(call.date, DATETIME_MINUTES_FORMAT),
                    call.call_type.name(),
                    call.phone_number(),
                    format_call_duration(call.duration_secs)
                )
            })
        }
    }
}

fn export_category(
    session: &BackupSession,
    category: Category,
    destination: &Path,
    kind: Option<KindArg>,
    single_file: bool,
    json: bool,
) -> anyhow::Result<ExportSummary> {
    let summary = match category {
        Category::CameraRoll => {
            let show_progress = !json && std::io::stderr().is_terminal();
            let summary = export_camera_roll(
                &session.camera_roll(),
                kind.map(Into::into),
                destination,
                |progress| {
                    if show_progress {
                        print_progress(progress);
                    }
                },
            )?;
            if show_progress {
                eprintln!();
            }
            summary
        }
        Category::Contacts => {
            let contacts = session.contacts().contacts()?;
            if single_file {
                let exported =
                    export_contacts_single(&contacts, &destination.join(CONTACTS_FILE_NAME))?;
                ExportSummary {
                    exported,
                    ..ExportSummary::default()
                }
            } else {
                export_contacts(&contacts, destination)?
            }
        }
        Category::Messages => export_chats(&session.messages().chats()?, destination)?,
        Category::Notes => export_notes(&session.notes().notes()?, destination)?,
        Category::CallHistory => {
            let exported = export_calls_csv(
                &session.call_history().calls()?,
                &destination.join(CALLS_FILE_NAME),
            )?;
            ExportSummary {
                exported,
                ..ExportSummary::default()
            }
        }
    };
    Ok(summary)
}

fn print_progress(progress: &ExportProgress) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\r[{}/{}] {:>5.1}% {}",
        progress.current,
        progress.total,
        progress.percentage(),
        progress.current_file
    );
    let _ = stderr.flush();
}

fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for item in data {
            println!("{}", row(item));
        }
    }
    Ok(())
}

fn print_one<T: Serialize>(
    json: bool,
    data: T,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}
