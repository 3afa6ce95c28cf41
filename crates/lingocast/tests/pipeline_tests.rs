//! End-to-end tests for the extract → transcreate → synthesize pipeline.

mod common;

use std::time::Duration;

use lingocast::db::{audio_repo, document_repo, transcreation_repo};
use lingocast::pipeline::AUDIO_DATA_URI_PREFIX;
use lingocast::{Config, ErrorKind, ServiceError, TextSource};

use common::fixtures::{long_text, padded_pdf, pdf_with_pages};
use common::harness::OCR_TEXT;
use common::TestHarness;

const RICH_PAGE: &str = "Quarterly revenue grew by twelve percent across all regions this year.";

async fn extract(h: &TestHarness, bytes: &[u8], name: &str) -> lingocast::Result<lingocast::ExtractResult> {
    h.pipeline.extract(bytes, name, bytes.len() as u64).await
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_text_layer_document() {
    let h = TestHarness::new();
    let bytes = pdf_with_pages(&[RICH_PAGE, "Second page closes the report."]);

    let result = extract(&h, &bytes, "report.pdf").await.unwrap();

    assert!(!result.cached);
    assert_eq!(result.text_source, TextSource::TextLayer);
    assert_eq!(result.page_count, 2);
    assert_eq!(result.extracted_page_count, 2);
    assert!(result.text.contains("Quarterly revenue grew"));
    assert!(result.text.contains("Second page closes the report."));
    assert!(!result.was_truncated);
    assert_eq!(result.original_length, result.extracted_length);
    assert_eq!(h.ocr_calls(), 0);
}

#[tokio::test]
async fn test_repeated_upload_is_served_from_cache() {
    let h = TestHarness::new();
    // Image-only pages force the OCR path on the first upload.
    let bytes = padded_pdf(&["", "", ""], 500 * 1024);
    assert!(bytes.len() > 500 * 1024);

    let first = extract(&h, &bytes, "scan.pdf").await.unwrap();
    assert!(!first.cached);
    assert_eq!(first.text_source, TextSource::Ocr);
    let ocr_calls = h.ocr_calls();
    assert_eq!(ocr_calls, 3);

    let second = extract(&h, &bytes, "scan.pdf").await.unwrap();
    assert!(second.cached);
    assert_eq!(second.text, first.text);
    assert_eq!(second.document_id, first.document_id);
    assert_eq!(second.text_source, TextSource::Ocr);
    assert_eq!(second.page_count, first.page_count);
    assert_eq!(h.ocr_calls(), ocr_calls);
    assert_eq!(h.transcreator.call_count(), 0);
    assert_eq!(document_repo::count(&h.db).unwrap(), 1);
}

#[tokio::test]
async fn test_cache_key_is_name_and_size() {
    let h = TestHarness::new();
    let a = pdf_with_pages(&[RICH_PAGE]);
    let b = pdf_with_pages(&[RICH_PAGE, RICH_PAGE]);

    let first = extract(&h, &a, "a.pdf").await.unwrap();
    let renamed = extract(&h, &a, "b.pdf").await.unwrap();
    let resized = extract(&h, &b, "a.pdf").await.unwrap();

    assert!(!renamed.cached);
    assert!(!resized.cached);
    assert_ne!(first.document_id, renamed.document_id);
    assert_ne!(first.document_id, resized.document_id);
}

#[tokio::test]
async fn test_ocr_threshold_boundary() {
    let h = TestHarness::new();

    let thin = pdf_with_pages(&[&"x".repeat(49)]);
    let result = extract(&h, &thin, "thin.pdf").await.unwrap();
    assert_eq!(result.text_source, TextSource::Ocr);
    assert_eq!(result.text, OCR_TEXT);
    assert_eq!(h.ocr_calls(), 1);

    let enough = pdf_with_pages(&[&"y".repeat(50)]);
    let result = extract(&h, &enough, "enough.pdf").await.unwrap();
    assert_eq!(result.text_source, TextSource::TextLayer);
    assert_eq!(result.text, "y".repeat(50));
    assert_eq!(h.ocr_calls(), 1);
}

#[tokio::test]
async fn test_page_cap_excludes_page_four() {
    let h = TestHarness::new();
    let pages = [
        "Page one talks about apples and their many varieties in detail.",
        "Page two talks about bananas and where they are usually grown.",
        "Page three talks about cherries and the short harvest season.",
        "Page four talks about dates which must never be extracted here.",
        "Page five talks about elderberries which are also out of range.",
    ];
    let bytes = pdf_with_pages(&pages);

    let result = extract(&h, &bytes, "fruit.pdf").await.unwrap();
    assert_eq!(result.page_count, 5);
    assert_eq!(result.extracted_page_count, 3);
    assert!(result.text.contains("cherries"));
    assert!(!result.text.contains("dates"));
    assert!(!result.text.contains("elderberries"));
}

#[tokio::test]
async fn test_ocr_fallback_limited_to_three_pages() {
    let h = TestHarness::new();
    let bytes = pdf_with_pages(&["", "", "", "", ""]);

    extract(&h, &bytes, "scan.pdf").await.unwrap();
    assert_eq!(h.render_calls(), 3);
    assert_eq!(h.ocr_calls(), 3);
}

#[tokio::test]
async fn test_long_document_truncated_consistently() {
    let h = TestHarness::new();
    let page = long_text(1000);
    let bytes = pdf_with_pages(&[&page, &page, &page]);

    let first = extract(&h, &bytes, "long.pdf").await.unwrap();
    assert!(first.was_truncated);
    assert!(first.original_length > 2200);
    assert!(first.extracted_length <= 2200);
    assert!(first.text.ends_with('.'));

    let cached = extract(&h, &bytes, "long.pdf").await.unwrap();
    assert!(cached.cached);
    assert_eq!(cached.text, first.text);
    assert_eq!(cached.original_length, first.original_length);
    assert!(cached.was_truncated);
}

#[tokio::test]
async fn test_text_is_normalized() {
    let h = TestHarness::new();
    let bytes = pdf_with_pages(&["Totals   are    final , and the spacing is repaired here ."]);

    let result = extract(&h, &bytes, "spacing.pdf").await.unwrap();
    assert_eq!(result.text, "Totals are final, and the spacing is repaired here.");
}

#[tokio::test]
async fn test_not_a_pdf_is_format_error() {
    let h = TestHarness::new();
    let err = extract(&h, b"hello, I am plain text", "fake.pdf").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(h.ocr_calls(), 0);
}

#[tokio::test]
async fn test_malformed_pdf_is_parse_error_without_fallback() {
    let h = TestHarness::new();
    let err = extract(&h, b"%PDF-1.4\n1 0 obj << /Broken", "broken.pdf")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(!err.kind().is_retryable());
    assert_eq!(h.ocr_calls(), 0);
    assert_eq!(document_repo::count(&h.db).unwrap(), 0);
}

#[tokio::test]
async fn test_upload_validation() {
    let mut config = Config::default();
    config.extraction.max_upload_bytes = 64 * 1024;
    let h = TestHarness::with_config(config);

    let small = pdf_with_pages(&[RICH_PAGE]);
    let err = h.pipeline.extract(&small, "notes.txt", small.len() as u64).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);

    let err = h.pipeline.extract(&small, "a.pdf", 3).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);

    let big = padded_pdf(&[RICH_PAGE], 70 * 1024);
    let err = extract(&h, &big, "big.pdf").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Size);
}

#[tokio::test]
async fn test_ocr_without_text_fails() {
    let h = TestHarness::with_ocr_text("   ");
    let bytes = pdf_with_pages(&["", ""]);

    let err = extract(&h, &bytes, "blank.pdf").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ocr);
    assert_eq!(err.user_message(), "Could not extract text from the document.");
    assert_eq!(document_repo::count(&h.db).unwrap(), 0);
}

#[tokio::test]
async fn test_ocr_timeout_is_an_ocr_error_and_cleans_up() {
    let mut config = Config::default();
    config.ocr.timeout_secs = 1;
    let h = TestHarness::with_slow_ocr(config, Duration::from_millis(1500));
    let bytes = pdf_with_pages(&["", ""]);

    let err = extract(&h, &bytes, "slow-scan.pdf").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ocr);
    assert!(err.user_message().contains("Could not extract text"));

    // The abandoned run finishes its current page, then stops.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.render_calls(), 1);
    assert_eq!(h.ocr_calls(), 1);
    let scratch = h.last_render_dir().unwrap();
    assert!(!scratch.exists());
    assert_eq!(document_repo::count(&h.db).unwrap(), 0);
}

#[tokio::test]
async fn test_ocr_disabled_keeps_short_text_layer() {
    let h = TestHarness::without_ocr();
    let bytes = pdf_with_pages(&["Short note."]);

    let result = extract(&h, &bytes, "note.pdf").await.unwrap();
    assert_eq!(result.text, "Short note.");
    assert_eq!(result.text_source, TextSource::TextLayer);
}

// ---------------------------------------------------------------------------
// Transcreation
// ---------------------------------------------------------------------------

/// Inserts placeholder documents so the next one gets `id`.
fn reserve_document_ids(h: &TestHarness, next_id: i64) {
    for i in 1..next_id {
        document_repo::insert(
            &h.db,
            &document_repo::NewDocument {
                original_filename: &format!("filler-{}.pdf", i),
                file_size: i as u64,
                extracted_text: "filler",
                page_count: 1,
                extracted_pages: 1,
                text_source: "text_layer",
            },
        )
        .unwrap();
    }
}

#[tokio::test]
async fn test_transcreation_cached_per_document_and_language() {
    let h = TestHarness::new();
    reserve_document_ids(&h, 7);
    let bytes = pdf_with_pages(&[RICH_PAGE]);
    let doc = extract(&h, &bytes, "report.pdf").await.unwrap();
    assert_eq!(doc.document_id, 7);

    let creds = TestHarness::credentials();
    let first = h
        .pipeline
        .transcreate(&doc.text, "Spanish", Some(7), &creds)
        .await
        .unwrap();
    assert!(!first.cached);
    assert_eq!(first.tokens_used, 321);
    assert!(first.transcreation_id.is_some());

    let second = h
        .pipeline
        .transcreate(&doc.text, "Spanish", Some(7), &creds)
        .await
        .unwrap();
    assert!(second.cached);
    assert_eq!(second.tokens_used, 0);
    assert_eq!(second.text, first.text);
    assert_eq!(second.transcreation_id, first.transcreation_id);
    assert_eq!(h.transcreator.call_count(), 1);

    let french = h
        .pipeline
        .transcreate(&doc.text, "French", Some(7), &creds)
        .await
        .unwrap();
    assert!(!french.cached);
    assert_eq!(h.transcreator.call_count(), 2);

    let row = document_repo::find_by_id(&h.db, 7).unwrap().unwrap();
    assert_eq!(row.status, document_repo::STATUS_TRANSCREATED);
}

#[tokio::test]
async fn test_transcreation_without_document_is_not_stored() {
    let h = TestHarness::new();
    let creds = TestHarness::credentials();

    let a = h.pipeline.transcreate("Hello there.", "German", None, &creds).await.unwrap();
    let b = h.pipeline.transcreate("Hello there.", "German", None, &creds).await.unwrap();

    assert!(!a.cached && !b.cached);
    assert_eq!(a.transcreation_id, None);
    assert_eq!(h.transcreator.call_count(), 2);
}

#[tokio::test]
async fn test_transcreation_input_validation() {
    let h = TestHarness::new();
    let creds = TestHarness::credentials();

    let err = h.pipeline.transcreate("  ", "Spanish", None, &creds).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);

    let err = h.pipeline.transcreate("Text.", "", None, &creds).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);

    let err = h.pipeline.transcreate("Text.", "Spanish", Some(99), &creds).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);
    assert_eq!(h.transcreator.call_count(), 0);
}

#[tokio::test]
async fn test_transcreation_input_is_budgeted() {
    let h = TestHarness::new();
    let text = long_text(5000);
    h.pipeline
        .transcreate(&text, "Italian", None, &TestHarness::credentials())
        .await
        .unwrap();

    let sent = h.transcreator.last_input.lock().unwrap().clone().unwrap();
    assert!(sent.chars().count() <= 2200);
}

#[tokio::test]
async fn test_stored_transcreation_records_input_length_before_budgeting() {
    let h = TestHarness::new();
    let doc = extract(&h, &pdf_with_pages(&[RICH_PAGE]), "report.pdf").await.unwrap();
    let text = long_text(5000);

    let result = h
        .pipeline
        .transcreate(&text, "Italian", Some(doc.document_id), &TestHarness::credentials())
        .await
        .unwrap();

    let row = transcreation_repo::find_by_id(&h.db, result.transcreation_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(row.original_length as usize, text.trim().chars().count());
    assert!(row.original_length > 2200);
    assert_eq!(row.transcreated_length as usize, result.text.chars().count());
}

#[tokio::test]
async fn test_service_errors_keep_their_kind_and_are_not_cached() {
    let h = TestHarness::new();
    let bytes = pdf_with_pages(&[RICH_PAGE]);
    let doc = extract(&h, &bytes, "report.pdf").await.unwrap();
    let creds = TestHarness::credentials();

    for (kind, retryable) in [
        (ErrorKind::Auth, false),
        (ErrorKind::Quota, true),
        (ErrorKind::ServiceUnavailable, true),
    ] {
        h.transcreator.fail_with(ServiceError::new(kind, "transcreation", "upstream said no"));
        let err = h
            .pipeline
            .transcreate(&doc.text, "Spanish", Some(doc.document_id), &creds)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind);
        assert_eq!(err.kind().is_retryable(), retryable);
    }

    h.transcreator.recover();
    let ok = h
        .pipeline
        .transcreate(&doc.text, "Spanish", Some(doc.document_id), &creds)
        .await
        .unwrap();
    assert!(!ok.cached);
    assert_eq!(
        transcreation_repo::list_for_document(&h.db, doc.document_id).unwrap().len(),
        1
    );
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_flow_with_audio_cache() {
    let h = TestHarness::new();
    let creds = TestHarness::credentials();
    let bytes = pdf_with_pages(&[RICH_PAGE]);

    let doc = extract(&h, &bytes, "report.pdf").await.unwrap();
    let t = h
        .pipeline
        .transcreate(&doc.text, "Spanish", Some(doc.document_id), &creds)
        .await
        .unwrap();

    let first = h
        .pipeline
        .synthesize(&t.text, "Spanish", t.transcreation_id, &creds)
        .await
        .unwrap();
    assert!(!first.cached);
    assert!(first.audio.starts_with(AUDIO_DATA_URI_PREFIX));
    assert_eq!(first.audio_size, h.synthesizer.audio.len());
    assert_eq!(first.characters_used, t.text.chars().count());
    assert_eq!(first.voice_id, "ErXwobaYiN019PkySvjV");
    assert!(first.audio_id.is_some());

    let second = h
        .pipeline
        .synthesize(&t.text, "Spanish", t.transcreation_id, &creds)
        .await
        .unwrap();
    assert!(second.cached);
    assert_eq!(second.characters_used, 0);
    assert_eq!(second.audio, first.audio);
    assert_eq!(h.synthesizer.call_count(), 1);

    let row = document_repo::find_by_id(&h.db, doc.document_id).unwrap().unwrap();
    assert_eq!(row.status, document_repo::STATUS_NARRATED);
}

#[tokio::test]
async fn test_speech_text_truncated_with_report() {
    let h = TestHarness::new();
    let text = long_text(4000);

    let result = h
        .pipeline
        .synthesize(&text, "English", None, &TestHarness::credentials())
        .await
        .unwrap();

    let truncation = result.truncation.unwrap();
    assert!(truncation.was_truncated);
    assert!(truncation.original_length > 2000);
    assert!(truncation.final_length <= 2003);
    let (sent, voice) = h.synthesizer.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(sent, truncation.text);
    assert_eq!(voice, "21m00Tcm4TlvDq8ikWAM");
    assert_eq!(result.audio_id, None);
}

#[tokio::test]
async fn test_unmapped_language_is_voice_error() {
    let h = TestHarness::new();
    let err = h
        .pipeline
        .synthesize("Qapla'.", "Klingon", None, &TestHarness::credentials())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Voice);
    assert_eq!(h.synthesizer.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_transcreation_rejected() {
    let h = TestHarness::new();
    let err = h
        .pipeline
        .synthesize("Hola.", "Spanish", Some(404), &TestHarness::credentials())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);
}

#[tokio::test]
async fn test_deleting_document_removes_subtree() {
    let h = TestHarness::new();
    let creds = TestHarness::credentials();
    let bytes = pdf_with_pages(&[RICH_PAGE]);

    let doc = extract(&h, &bytes, "report.pdf").await.unwrap();
    let t = h
        .pipeline
        .transcreate(&doc.text, "Hindi", Some(doc.document_id), &creds)
        .await
        .unwrap();
    let transcreation_id = t.transcreation_id.unwrap();
    h.pipeline
        .synthesize(&t.text, "Hindi", Some(transcreation_id), &creds)
        .await
        .unwrap();

    assert!(document_repo::delete(&h.db, doc.document_id).unwrap());
    assert!(transcreation_repo::find_by_id(&h.db, transcreation_id).unwrap().is_none());
    assert!(audio_repo::find_latest(&h.db, transcreation_id).unwrap().is_none());

    let again = extract(&h, &bytes, "report.pdf").await.unwrap();
    assert!(!again.cached);
}
