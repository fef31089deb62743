//! End-to-end flow over the in-memory backend: sign in, upload a video,
//! schedule it, commit, and watch the TV resolver pick it up.

use std::sync::Arc;

use bytes::Bytes;
use jiff::tz::TimeZone;
use jiff::Timestamp;

use slotcast::backend::memory::MemoryBackend;
use slotcast::limits::DISPLAY_TZ;
use slotcast::media::MediaLibrary;
use slotcast::model::{TenantId, Weekday};
use slotcast::schedule::{ScheduleError, ScheduleService};
use slotcast::session::SessionState;

fn tz() -> TimeZone {
    TimeZone::get(DISPLAY_TZ).unwrap()
}

/// Stockholm wall-clock on the week of 2026-08-03 (a Monday).
fn stockholm(day: Weekday, hour: i8, minute: i8) -> Timestamp {
    jiff::civil::date(2026, 8, 3 + day as i8)
        .at(hour, minute, 0, 0)
        .to_zoned(tz())
        .unwrap()
        .timestamp()
}

#[tokio::test]
async fn edit_session_reaches_the_tv() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_user("owner@resto.se", "hemligt", TenantId::new("resto-1"));

    // Sign in and pick up the tenant.
    let session = SessionState::new(backend.clone());
    session.init().await.unwrap();
    assert!(session.tenant().await.is_none());
    session.sign_in("owner@resto.se", "hemligt").await.unwrap();
    let tenant = session.tenant().await.unwrap();

    // Upload a video and find it in the library listing.
    let library = MediaLibrary::new(backend.clone());
    let stored = library
        .upload("dagens lunch.mp4", "video/mp4", Bytes::from_static(b"mp4"))
        .await
        .unwrap();
    let videos = library.list().await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].name, stored);

    // Schedule it Mon 16:00-18:00 and commit.
    let service = ScheduleService::new(backend.clone());
    let mut draft = service.edit(&tenant).await.unwrap();
    draft
        .stage(Weekday::Mon, 32, 36, videos[0].clone())
        .unwrap();
    let committed = service.commit(&mut draft).await.unwrap();
    assert_eq!(committed.len(), 1);
    assert!(committed[0].id.is_some());

    // The TV resolves it during the range and nothing outside it.
    let playing = service
        .resolve_now(&tenant, stockholm(Weekday::Mon, 17, 10), &tz())
        .await
        .unwrap()
        .expect("a video should be on air");
    assert_eq!(playing.media.name, stored);
    assert_eq!(playing.media.url, videos[0].url);

    assert!(service
        .resolve_now(&tenant, stockholm(Weekday::Mon, 15, 59), &tz())
        .await
        .unwrap()
        .is_none());
    assert!(service
        .resolve_now(&tenant, stockholm(Weekday::Tue, 17, 10), &tz())
        .await
        .unwrap()
        .is_none());

    // Deleting the day takes it off the air immediately.
    service.delete_day(&tenant, Weekday::Mon).await.unwrap();
    assert!(service
        .resolve_now(&tenant, stockholm(Weekday::Mon, 17, 10), &tz())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn double_booking_is_rejected_end_to_end() {
    let backend = Arc::new(MemoryBackend::new());
    let tenant = TenantId::new("resto-1");
    let service = ScheduleService::new(backend.clone());
    let library = MediaLibrary::new(backend.clone());

    let a = library
        .upload("a.mp4", "video/mp4", Bytes::from_static(b"a"))
        .await
        .unwrap();
    let b = library
        .upload("b.mp4", "video/mp4", Bytes::from_static(b"b"))
        .await
        .unwrap();
    let videos = library.list().await.unwrap();
    let video_a = videos.iter().find(|v| v.name == a).unwrap().clone();
    let video_b = videos.iter().find(|v| v.name == b).unwrap().clone();

    let mut draft = service.edit(&tenant).await.unwrap();
    draft.stage(Weekday::Mon, 32, 36, video_a).unwrap();
    let err = draft
        .stage(Weekday::Mon, 34, 38, video_b.clone())
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Conflict));

    // The adjacent range goes through and both survive the commit.
    draft.stage(Weekday::Mon, 36, 38, video_b).unwrap();
    let committed = service.commit(&mut draft).await.unwrap();
    assert_eq!(committed.len(), 2);

    // 18:15 falls in the second entry: boundary handed over cleanly.
    let playing = service
        .resolve_now(&tenant, stockholm(Weekday::Mon, 18, 15), &tz())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(playing.media.name, b);
}
