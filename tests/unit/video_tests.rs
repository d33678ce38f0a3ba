/*!
 * Tests for video descriptors
 */

use std::path::Path;

use mkvembed::video::{GroupingAttribute, Video, VideoKind};

#[test]
fn test_fromPath_withEpisodeMarker_shouldBuildEpisode() {
    let video = Video::from_path("/in/The.Wire.S02E05.Undertow.mkv");

    assert_eq!(
        video.kind,
        VideoKind::Episode {
            series: "The Wire".to_string(),
            season: 2,
            episode: 5,
        }
    );
    assert_eq!(video.title.as_deref(), Some("Undertow"));
    assert_eq!(video.output_stem(), "05 - Undertow");
    assert!(video.is_episode());
}

#[test]
fn test_fromPath_withEpisodeMarkerOnly_shouldKeepSourceStem() {
    let video = Video::from_path("/in/Dark s1e3.mp4");

    assert!(matches!(video.kind, VideoKind::Episode { season: 1, episode: 3, .. }));
    assert_eq!(video.title, None);
    assert_eq!(video.output_stem(), "Dark s1e3");
}

#[test]
fn test_fromPath_withYear_shouldBuildMovie() {
    let video = Video::from_path("/in/Man.of.Steel.2013.1080p.BluRay.mkv");
    assert_eq!(video.kind, VideoKind::Movie { year: Some(2013) });
    assert_eq!(video.title.as_deref(), Some("Man of Steel"));

    let bracketed = Video::from_path("/in/Arrival (2016).mp4");
    assert_eq!(bracketed.kind, VideoKind::Movie { year: Some(2016) });
    assert_eq!(bracketed.output_stem(), "Arrival");
    assert!(bracketed.is_movie());
}

#[test]
fn test_fromPath_withoutMarkers_shouldBeOther() {
    let video = Video::from_path("/in/holiday clip.mkv");

    assert_eq!(video.kind, VideoKind::Other);
    assert_eq!(video.output_stem(), "holiday clip");
    assert_eq!(video.to_string(), "/in/holiday clip.mkv");
}

#[test]
fn test_groupingValue_onlyForMovies() {
    let mut movie = Video::movie(Path::new("/in/a.mkv"), Some("A".to_string()), None);
    movie.metadata.genre = Some("Drama".to_string());
    movie.metadata.country = Some("  ".to_string());

    assert_eq!(movie.grouping_value(GroupingAttribute::Genre), Some("Drama"));
    assert_eq!(movie.grouping_value(GroupingAttribute::Country), None);
    assert!(movie.is_missing_any(&[GroupingAttribute::Genre, GroupingAttribute::Country]));
    assert!(!movie.is_missing_any(&[GroupingAttribute::Genre]));

    let mut episode = Video::episode("/in/e.mkv", "Show", 1, 2, None);
    episode.metadata.genre = Some("Drama".to_string());
    assert_eq!(episode.grouping_value(GroupingAttribute::Genre), None);
    assert!(!episode.is_missing_any(&[GroupingAttribute::Genre]));
}

#[test]
fn test_groupingAttribute_parse_shouldAcceptAliases() {
    assert_eq!("lang".parse::<GroupingAttribute>().ok(), Some(GroupingAttribute::Language));
    assert_eq!(" Country ".parse::<GroupingAttribute>().ok(), Some(GroupingAttribute::Country));
    assert!("director".parse::<GroupingAttribute>().is_err());
    assert_eq!(GroupingAttribute::Genre.to_string(), "genre");
}

#[test]
fn test_display_shouldDescribeVideo() {
    let episode = Video::episode("/in/e.mkv", "The Wire", 2, 5, Some("Undertow".to_string()));
    assert_eq!(episode.to_string(), "The Wire s02e05 - Undertow");

    let movie = Video::movie("/in/a.mkv", Some("Arrival".to_string()), Some(2016));
    assert_eq!(movie.to_string(), "Arrival (2016)");
}
