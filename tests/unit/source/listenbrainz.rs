use super::*;

const LISTENS: &str = r#"{
  "payload": {
    "count": 3,
    "user_id": "someone",
    "listens": [
      {
        "listened_at": 1700000000,
        "recording_msid": "x",
        "track_metadata": {
          "artist_name": "Stereolab",
          "track_name": "French Disko",
          "release_name": "Refried Ectoplasm",
          "additional_info": {"release_mbid": "ignored-when-mapped"},
          "mbid_mapping": {
            "caa_id": 12345,
            "caa_release_mbid": "0b6c3d0e-aaaa-bbbb-cccc-1234567890ab"
          }
        }
      },
      {
        "listened_at": 1699990000,
        "track_metadata": {
          "artist_name": "Broadcast",
          "track_name": "Come On Let's Go",
          "additional_info": {"release_mbid": "11111111-2222-3333-4444-555555555555"}
        }
      },
      {
        "listened_at": 1699980000,
        "track_metadata": {
          "artist_name": "Unknown",
          "track_name": "Untitled",
          "mbid_mapping": {"caa_id": null, "caa_release_mbid": null}
        }
      }
    ]
  }
}"#;

#[test]
fn maps_listens_with_cover_art_archive_urls() {
    let tracks = parse_listens(LISTENS).unwrap();
    assert_eq!(tracks.len(), 3);

    assert_eq!(
        tracks[0],
        TrackRecord::new(
            "Stereolab",
            "French Disko",
            "https://coverartarchive.org/release/0b6c3d0e-aaaa-bbbb-cccc-1234567890ab/12345-250.jpg",
            1_700_000_000,
        )
    );
    assert_eq!(
        tracks[1].cover_ref,
        "https://coverartarchive.org/release/11111111-2222-3333-4444-555555555555/front-250"
    );
    assert_eq!(tracks[2].cover_ref, "");
    assert_eq!(tracks[2].listened_at, 1_699_980_000);
}

#[test]
fn empty_payload() {
    let tracks = parse_listens(r#"{"payload": {"count": 0, "listens": []}}"#).unwrap();
    assert!(tracks.is_empty());
}

#[test]
fn malformed_body_is_source_unavailable() {
    let err = parse_listens(r#"{"code": 404, "error": "Cannot find user"}"#).unwrap_err();
    assert!(matches!(err, LastListenedError::SourceUnavailable(_)));
}
