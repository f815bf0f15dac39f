//! People, ingested event and user repository integration tests.
//!
//! Require a PostgreSQL instance at `DATABASE_URL`; skipped otherwise.

use serde_json::json;

use diary_db::test_fixtures::{unique_name, TestDatabase};
use diary_db::{
    DebugLogRepository, EventExtraction, EventRepository, NewEvent, NoteInput, NotePersonLink,
    NoteRepository, PersonRepository, UserRepository,
};

#[tokio::test]
async fn test_person_detail_lists_linked_notes_with_role() {
    let Some(t) = TestDatabase::from_env().await else {
        return;
    };
    let ana = t.person("Ana").await;
    t.db.notes
        .create(&NoteInput {
            content: "Pediatrician visit".to_string(),
            people: vec![NotePersonLink {
                id: ana.id,
                role: Some("patient".to_string()),
            }],
            ..Default::default()
        })
        .await
        .unwrap();

    let detail = t.db.people.get_detail(ana.id).await.unwrap().unwrap();
    assert_eq!(detail.person.id, ana.id);
    assert_eq!(detail.linked_notes.len(), 1);
    assert_eq!(detail.linked_notes[0].role.as_deref(), Some("patient"));
    assert_eq!(detail.linked_notes[0].note.content, "Pediatrician visit");

    t.db.people.delete(ana.id).await.unwrap();
    assert!(t.db.people.get_detail(ana.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_extraction_marks_event_processed() {
    let Some(t) = TestDatabase::from_env().await else {
        return;
    };
    let file_id = unique_name("voice");
    let event_id = t
        .db
        .events
        .insert(&NewEvent {
            telegram_file_id: file_id.clone(),
            audio_url: format!("/api/audio/{}.ogg", file_id),
            transcription: "Paid the plumber 80 dollars".to_string(),
            raw_metadata: json!({ "chat": { "id": 1 } }),
        })
        .await
        .unwrap();

    t.db.events
        .store_extraction(
            event_id,
            &EventExtraction {
                summary: "Paid the plumber".to_string(),
                category: "Finance".to_string(),
                importance: "Medium".to_string(),
                entities: json!({ "money": ["80 dollars"] }),
            },
        )
        .await
        .unwrap();

    let events = t.db.events.list().await.unwrap();
    let event = events.iter().find(|e| e.id == event_id).unwrap();
    assert!(event.processed);
    assert_eq!(event.raw_metadata.as_ref().unwrap()["chat"]["id"], 1);

    let data = t.db.events.list_data(Some(event_id)).await.unwrap();
    let keys: Vec<&str> = data.iter().map(|d| d.data.key.as_str()).collect();
    assert_eq!(keys, vec!["summary", "category", "importance", "entities"]);
    assert_eq!(
        data[0].event_preview.as_deref(),
        Some("Paid the plumber 80 dollars")
    );
    assert_eq!(data[3].data.value, r#"{"money":["80 dollars"]}"#);
}

#[tokio::test]
async fn test_debug_log_round_trip() {
    let Some(t) = TestDatabase::from_env().await else {
        return;
    };
    let payload = json!({ "update_id": 77, "marker": unique_name("debug") }).to_string();
    t.db.debug_logs.record(&payload, "sam").await.unwrap();

    let recent = t.db.debug_logs.recent(50).await.unwrap();
    let entry = recent.iter().find(|l| l.payload == payload).unwrap();
    assert_eq!(entry.sender.as_deref(), Some("sam"));
}

#[tokio::test]
async fn test_user_login_lookup_and_token() {
    let Some(t) = TestDatabase::from_env().await else {
        return;
    };
    let email = format!("{}@example.com", unique_name("user"));
    let user = t
        .db
        .users
        .create(&email, Some("Parent"), "$argon2id$v=19$placeholder")
        .await
        .unwrap();

    let creds = t.db.users.find_by_login(&email).await.unwrap().unwrap();
    assert_eq!(creds.user, user);
    assert!(creds.magic_link_token.is_none());

    let token = unique_name("token");
    t.db.users.set_token(user.id, &token).await.unwrap();
    assert_eq!(t.db.users.find_by_token(&token).await.unwrap(), Some(user));
    assert!(t.db.users.find_by_token("missing").await.unwrap().is_none());

    let duplicate = t.db.users.create(&email, None, "x").await;
    assert!(duplicate.is_err());
}
