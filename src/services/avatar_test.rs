use super::*;
use crate::services::session::{Session, SessionTokens};
use crate::state::test_helpers::FakeBaas;
use uuid::Uuid;

fn active(user_id: Uuid) -> ActiveSession {
    ActiveSession {
        session: Session { user_id, email: Some("a@example.com".into()), email_confirmed_at: None },
        tokens: SessionTokens { access_token: "at".into(), refresh_token: None },
        refreshed: false,
    }
}

fn upload(name: Option<&str>, bytes: Vec<u8>) -> AvatarUpload {
    AvatarUpload { file_name: name.map(str::to_owned), content_type: None, bytes }
}

#[test]
fn extension_from_file_name() {
    assert_eq!(upload(Some("me.JPG"), vec![1]).extension(), "jpg");
    assert_eq!(upload(Some("archive.tar.gz"), vec![1]).extension(), "gz");
    assert_eq!(upload(Some("noext"), vec![1]).extension(), "png");
    assert_eq!(upload(Some("weird.p/g"), vec![1]).extension(), "png");
    assert_eq!(upload(None, vec![1]).extension(), "png");
}

#[test]
fn size_and_type_limits() {
    assert!(upload(Some("a.png"), vec![0; MAX_AVATAR_BYTES]).validate().is_ok());
    assert!(matches!(
        upload(Some("a.png"), vec![0; MAX_AVATAR_BYTES + 1]).validate(),
        Err(ProfileError::Upload(_))
    ));
    assert!(matches!(upload(Some("a.png"), Vec::new()).validate(), Err(ProfileError::Upload(_))));

    let pdf = AvatarUpload { file_name: Some("cv.pdf".into()), content_type: Some("application/pdf".into()), bytes: vec![1] };
    assert!(matches!(pdf.validate(), Err(ProfileError::Upload(_))));
}

#[tokio::test]
async fn replace_clears_folder_and_sets_cache_busted_url() {
    let fake = FakeBaas::new();
    let feed: Feed<ProfileChange> = Feed::default();
    let user_id = Uuid::new_v4();
    fake.with(|inner| {
        inner.files.insert(format!("avatars/{user_id}/avatar-1.png"), vec![9]);
        inner.files.insert("avatars/someone-else/avatar-1.png".into(), vec![9]);
    });

    let saved = replace_avatar(
        fake.as_ref(),
        fake.as_ref(),
        &feed,
        "avatars",
        &active(user_id),
        upload(Some("me.jpg"), vec![1, 2, 3]),
        1_700_000_000_000,
    )
    .await
    .unwrap();

    let expected_path = format!("avatars/{user_id}/avatar-1700000000000.jpg");
    assert_eq!(
        saved.avatar_url.as_deref(),
        Some(format!("https://files.test/{expected_path}?v=1700000000000").as_str())
    );
    fake.with(|inner| {
        assert_eq!(inner.removed, vec![format!("avatars/{user_id}/avatar-1.png")]);
        assert!(inner.files.contains_key(&expected_path));
        assert!(inner.files.contains_key("avatars/someone-else/avatar-1.png"));
    });
    assert_eq!(saved.email.as_deref(), Some("a@example.com"), "row created lazily");
}

#[tokio::test]
async fn rejected_file_touches_nothing() {
    let fake = FakeBaas::new();
    let feed: Feed<ProfileChange> = Feed::default();
    let err = replace_avatar(
        fake.as_ref(),
        fake.as_ref(),
        &feed,
        "avatars",
        &active(Uuid::new_v4()),
        upload(Some("a.png"), Vec::new()),
        1,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProfileError::Upload(_)));
    assert!(fake.with(|inner| inner.files.is_empty() && inner.removed.is_empty()));
}

#[test]
fn unix_millis_is_recent() {
    assert!(unix_millis() > 1_700_000_000_000);
}
