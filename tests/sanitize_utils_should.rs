use relay::server::models::Container;
use relay::server::utils::sanitize_utils::{parse_segment_url, sanitize_extension, sanitize_id};

#[test]
fn test_accepts_plain_ids() {
    let longest = "x".repeat(50);
    for id in ["12345", "abc_DEF-9", "a", longest.as_str()] {
        assert_eq!(sanitize_id(id).as_deref(), Some(id));
    }
}

#[test]
fn test_trims_surrounding_whitespace() {
    assert_eq!(sanitize_id("  42 ").as_deref(), Some("42"));
}

#[test]
fn test_rejects_unsafe_ids() {
    let long = "9".repeat(51);
    for id in [
        "",
        "   ",
        "../etc/passwd",
        "12/34",
        "12.mp4",
        "id with space",
        "123?x=1",
        "%2e%2e",
        long.as_str(),
    ] {
        assert_eq!(sanitize_id(id), None, "{id:?} should be rejected");
    }
}

#[test]
fn test_keeps_allow_listed_extensions() {
    assert_eq!(sanitize_extension(Some("mkv")), Container::Mkv);
    assert_eq!(sanitize_extension(Some("M3U8")), Container::M3u8);
    assert_eq!(sanitize_extension(Some(".ts")), Container::Ts);
    assert_eq!(sanitize_extension(Some("avi")), Container::Avi);
    assert_eq!(sanitize_extension(Some("mp4")), Container::Mp4);
}

#[test]
fn test_unsupported_extensions_become_mp4() {
    for ext in ["", "exe", "mp4;rm", "webm", "m3u", "flv"] {
        assert_eq!(sanitize_extension(Some(ext)), Container::Mp4, "{ext:?}");
    }
    assert_eq!(sanitize_extension(None), Container::Mp4);
}

#[test]
fn test_segment_urls_must_be_absolute_http() {
    assert!(parse_segment_url("https://cdn.example.com/live/seg-001.ts").is_some());
    assert!(parse_segment_url("http://10.0.0.2:8080/hls/1.ts?token=abc").is_some());

    assert!(parse_segment_url("not-a-url").is_none());
    assert!(parse_segment_url("/relative/seg.ts").is_none());
    assert!(parse_segment_url("ftp://cdn.example.com/seg.ts").is_none());
    assert!(parse_segment_url("file:///etc/passwd").is_none());
}
