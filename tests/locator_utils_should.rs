use relay::config::ProviderConfig;
use relay::server::error::Error;
use relay::server::models::{Container, ContentKind, PlaybackRequest};
use relay::server::utils::locator_utils::ResourceLocator;
use url::Url;

fn provider() -> ProviderConfig {
    ProviderConfig {
        base_url: Url::parse("http://provider.example.com").unwrap(),
        live_base_url: Url::parse("http://provider.example.com:8080").unwrap(),
        username: "user".to_string(),
        password: "pass".to_string(),
    }
}

#[test]
fn test_movie_url() {
    let locator = ResourceLocator::new(provider());
    let request = PlaybackRequest::new(ContentKind::Movie, "1234").with_extension(Some("mkv".into()));

    let target = locator.locate(&request).unwrap();

    assert_eq!(
        target.url.as_str(),
        "http://provider.example.com/movie/user/pass/1234.mkv"
    );
    assert_eq!(target.container, Some(Container::Mkv));
    assert_eq!(target.kind, ContentKind::Movie);
}

#[test]
fn test_series_url_with_coerced_extension() {
    let locator = ResourceLocator::new(provider());
    let request =
        PlaybackRequest::new(ContentKind::Series, "ep_77").with_extension(Some("exe".into()));

    let target = locator.locate(&request).unwrap();

    assert_eq!(
        target.url.as_str(),
        "http://provider.example.com/series/user/pass/ep_77.mp4"
    );
}

#[test]
fn test_live_uses_live_base_and_m3u8() {
    let locator = ResourceLocator::new(provider());
    let request = PlaybackRequest::new(ContentKind::Live, "99").with_extension(Some("ts".into()));

    let target = locator.locate(&request).unwrap();

    assert_eq!(
        target.url.as_str(),
        "http://provider.example.com:8080/live/user/pass/99.m3u8"
    );
    assert_eq!(target.container, Some(Container::M3u8));
}

#[test]
fn test_base_with_trailing_slash_and_path() {
    let mut config = provider();
    config.base_url = Url::parse("https://provider.example.com/iptv/").unwrap();
    let locator = ResourceLocator::new(config);

    let target = locator
        .locate(&PlaybackRequest::new(ContentKind::Movie, "5"))
        .unwrap();

    assert_eq!(
        target.url.as_str(),
        "https://provider.example.com/iptv/movie/user/pass/5.mp4"
    );
}

#[test]
fn test_credentials_are_percent_encoded() {
    let mut config = provider();
    config.password = "p@ss/word".to_string();
    let locator = ResourceLocator::new(config);

    let target = locator
        .locate(&PlaybackRequest::new(ContentKind::Movie, "5"))
        .unwrap();

    assert_eq!(
        target.url.as_str(),
        "http://provider.example.com/movie/user/p@ss%2Fword/5.mp4"
    );
}

#[test]
fn test_every_valid_id_lands_in_the_url() {
    let locator = ResourceLocator::new(provider());
    let longest = "z".repeat(50);

    for id in ["1", "abc", "A-b_C", "0123456789", longest.as_str()] {
        for kind in [ContentKind::Movie, ContentKind::Series, ContentKind::Live] {
            let target = locator.locate(&PlaybackRequest::new(kind, id)).unwrap();
            let file = target.url.path_segments().unwrap().next_back().unwrap();
            assert!(file.starts_with(&format!("{id}.")), "{file} for {id}");
        }
    }
}

#[test]
fn test_invalid_id_is_bad_request() {
    let locator = ResourceLocator::new(provider());
    let too_long = "1".repeat(51);

    for id in ["", "../1", "1 2", too_long.as_str()] {
        let result = locator.locate(&PlaybackRequest::new(ContentKind::Movie, id));
        assert!(matches!(result, Err(Error::BadRequest(_))), "{id:?}");
    }
}

#[test]
fn test_segment_passthrough() {
    let locator = ResourceLocator::new(provider());
    let request = PlaybackRequest::new(
        ContentKind::Segment,
        "https://cdn.example.com/hls/chunk-17.ts?token=abc",
    );

    let target = locator.locate(&request).unwrap();

    assert_eq!(
        target.url.as_str(),
        "https://cdn.example.com/hls/chunk-17.ts?token=abc"
    );
    assert_eq!(target.container, Some(Container::Ts));
}

#[test]
fn test_segment_without_known_suffix_has_no_container() {
    let locator = ResourceLocator::new(provider());
    let request = PlaybackRequest::new(ContentKind::Segment, "https://cdn.example.com/hls/chunk");

    assert_eq!(locator.locate(&request).unwrap().container, None);
}

#[test]
fn test_segment_rejects_relative_url() {
    let locator = ResourceLocator::new(provider());
    let request = PlaybackRequest::new(ContentKind::Segment, "not-a-url");

    assert!(matches!(locator.locate(&request), Err(Error::BadRequest(_))));
}

#[test]
fn test_unknown_kind_is_bad_request() {
    assert_eq!("Series".parse::<ContentKind>().unwrap(), ContentKind::Series);
    assert!(matches!(
        "podcast".parse::<ContentKind>(),
        Err(Error::BadRequest(_))
    ));
}
