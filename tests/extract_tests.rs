//! Integration tests for report processing: header scan, wrapper scan and
//! extraction of the original message.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use mail_parser::MessageParser;
use spamextract::export::eml::Stamp;
use spamextract::processor::{ExtractOptions, Extraction, MailProcessor};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn processor(dir: &Path) -> MailProcessor {
    MailProcessor::new(ExtractOptions {
        output_dir: dir.to_path_buf(),
        ..ExtractOptions::default()
    })
}

// ─── End-to-end scenario with a fixed stamp ─────────────────────────

#[test]
fn test_minimal_report_exact_output() {
    let tmp = tempfile::tempdir().unwrap();
    let report = b"Subject: [SPAM] test\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
Spam detection software has flagged this message.\r\n\
--XYZ\r\n\
Content-Type: message/rfc822; x-spam-type=original\r\n\
\r\n\
Message-ID: <orig@x>\r\n\
Body text\r\n\
--XYZ\r\n";

    let stamp = Stamp::new("1704362400.654321");
    let result = processor(tmp.path())
        .process_reader(Cursor::new(&report[..]), "scenario", &stamp)
        .unwrap();

    let path = result.into_path().expect("original should be extracted");
    assert_eq!(
        path.file_name().unwrap(),
        "non-spam-msg-1704362400.654321.eml"
    );
    assert_eq!(
        std::fs::read(&path).unwrap(),
        b"Message-ID: <orig@x.1704362400.654321.harris.ch>\r\n\
X-Original-Message-ID: <orig@x>\r\n\
Body text\r\n"
    );
}

// ─── Full SpamAssassin-style report from disk ───────────────────────

#[test]
fn test_fixture_report_is_extracted() {
    let tmp = tempfile::tempdir().unwrap();
    let result = processor(tmp.path())
        .process(&fixture("spam_report.eml"))
        .unwrap();
    let path = result.path().expect("extracted").to_path_buf();
    assert!(path.starts_with(tmp.path()));

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("non-spam-msg-") && name.ends_with(".eml"));

    let bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();

    assert!(text.starts_with("Return-Path: <bounce@spammer.example>\r\n"));
    assert!(text.contains("X-Original-Message-ID: <20240104100000.ABC123@spammer.example>\r\n"));
    assert!(text.contains("Message-ID: <20240104100000.ABC123@spammer.example."));
    assert!(text.contains(".harris.ch>\r\n"));
    assert!(text.ends_with("Best prices on watches.\r\n\r\n"));
    // Nothing of the wrapper survives
    assert!(!text.contains("=_65A1B2C3"));
    assert!(!text.contains("[SPAM]"));
    assert!(!text.contains("Spam detection software"));
}

#[test]
fn test_extracted_message_parses() {
    let tmp = tempfile::tempdir().unwrap();
    let path = processor(tmp.path())
        .process(&fixture("spam_report.eml"))
        .unwrap()
        .into_path()
        .expect("extracted");
    let bytes = std::fs::read(&path).unwrap();

    let message = MessageParser::default()
        .parse(&bytes)
        .expect("extracted output should be a valid message");
    assert_eq!(message.subject(), Some("Cheap watches"));
    let id = message.message_id().expect("Message-ID header");
    assert!(id.starts_with("20240104100000.ABC123@spammer.example."));
    assert!(id.ends_with(".harris.ch"));
    let body = message.body_text(0).expect("text body");
    assert!(body.contains("Best prices on watches."));
}

#[test]
fn test_rewritten_id_uses_stamp_from_filename() {
    let tmp = tempfile::tempdir().unwrap();
    let path = processor(tmp.path())
        .process(&fixture("spam_report.eml"))
        .unwrap()
        .into_path()
        .expect("extracted");
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    let stamp = name
        .strip_prefix("non-spam-msg-")
        .and_then(|s| s.strip_suffix(".eml"))
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let expected = format!("Message-ID: <20240104100000.ABC123@spammer.example.{stamp}.harris.ch>\r\n");
    assert!(text.contains(&expected), "missing {expected:?} in {text:?}");
}

#[test]
fn test_custom_domain() {
    let tmp = tempfile::tempdir().unwrap();
    let processor = MailProcessor::new(ExtractOptions {
        output_dir: tmp.path().to_path_buf(),
        message_id_domain: "mail.example.org".to_string(),
    });
    let report = b"Subject: [SPAM] x\n\nContent-Type: message/rfc822; x-spam-type=original\n\nMessage-ID: <a@b>\n";
    let path = processor
        .process_reader(Cursor::new(&report[..]), "test", &Stamp::new("5.000000"))
        .unwrap()
        .into_path()
        .unwrap();
    assert_eq!(
        std::fs::read(&path).unwrap(),
        b"Message-ID: <a@b.5.000000.mail.example.org>\r\nX-Original-Message-ID: <a@b>\r\n"
    );
}

// ─── Nothing to extract ─────────────────────────────────────────────

#[test]
fn test_not_spam_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let processor = processor(tmp.path());
    for _ in 0..3 {
        let result = processor.process(&fixture("not_spam.eml")).unwrap();
        assert_eq!(result, Extraction::NotSpam);
    }
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_spam_without_original_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let processor = processor(tmp.path());
    for _ in 0..3 {
        let result = processor.process(&fixture("spam_no_original.eml")).unwrap();
        assert_eq!(result, Extraction::NoOriginal);
    }
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_spam_subject_elsewhere_is_not_spam() {
    let tmp = tempfile::tempdir().unwrap();
    let report = b"From: x\nX-Subject: [SPAM] hidden\nSubject: normal\n\nSubject: [SPAM] in body\n";
    let result = processor(tmp.path())
        .process_reader(Cursor::new(&report[..]), "test", &Stamp::new("1.0"))
        .unwrap();
    assert_eq!(result, Extraction::NotSpam);
}

// ─── Edge cases ─────────────────────────────────────────────────────

#[test]
fn test_missing_boundary_copies_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    // Unquoted boundary does not match, so there is no delimiter to stop at
    let report = b"Subject: [SPAM] x\nContent-Type: multipart/mixed; boundary=B\n\n--B\nContent-Type: message/rfc822; x-spam-type=original\n\nSubject: y\n\nbody\n--B--\n";
    let path = processor(tmp.path())
        .process_reader(Cursor::new(&report[..]), "test", &Stamp::new("1.0"))
        .unwrap()
        .into_path()
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"Subject: y\n\nbody\n--B--\n");
}

#[test]
fn test_latin1_report() {
    let tmp = tempfile::tempdir().unwrap();
    let path = processor(tmp.path())
        .process(&fixture("spam_latin1.eml"))
        .unwrap()
        .into_path()
        .expect("extracted");
    let bytes = std::fs::read(&path).unwrap();

    // Copied lines keep their ISO-8859-1 bytes
    assert!(bytes.starts_with(b"From: deals@spammer.example\nSubject: R\xe9sum\xe9 offer\n"));
    assert!(bytes.ends_with(b"\nCorps du message \xe0 lire.\n\n"));
    // The rewritten ID keeps the original bytes too
    let needle = b"X-Original-Message-ID: <caf\xe9-01@spammer.example>\r\n";
    assert!(bytes.windows(needle.len()).any(|w| w == needle));
    assert!(!bytes.windows(8).any(|w| w == b"--latin-"));
}

#[test]
fn test_two_extractions_never_share_a_file() {
    let tmp = tempfile::tempdir().unwrap();
    let processor = processor(tmp.path());
    let stamp = Stamp::new("1.000000");
    let report = b"Subject: [SPAM] x\n\nContent-Type: message/rfc822; x-spam-type=original\n\nbody\n";
    let a = processor
        .process_reader(Cursor::new(&report[..]), "a", &stamp)
        .unwrap()
        .into_path()
        .unwrap();
    let b = processor
        .process_reader(Cursor::new(&report[..]), "b", &stamp)
        .unwrap()
        .into_path()
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}
