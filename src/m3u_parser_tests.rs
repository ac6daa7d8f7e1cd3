//! Tests for M3U playlist parsing

use super::*;
use crate::ident::ID_PREFIX;

#[test]
fn test_parse_m3u() {
    let content = r#"
#EXTM3U
#EXTINF:-1 tvg-id="cnn" group-title="News",CNN
http://example.com/live/user/pass/1.ts
#EXTINF:-1 tvg-id="bbc" group-title="News",BBC
http://example.com/live/user/pass/2.ts
"#;
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels.len(), 2);
    assert_eq!(playlist.channels[0].name, "CNN");
    assert_eq!(playlist.channels[0].id, "cnn");
    assert_eq!(playlist.channels[0].group_title, "News");
    assert_eq!(playlist.channels[1].url, "http://example.com/live/user/pass/2.ts");
}

#[test]
fn test_two_channels_one_group() {
    let content = "#EXTM3U\n#EXTINF:-1 group-title=\"News\",Channel A\nhttp://a\n#EXTINF:-1 group-title=\"News\",Channel B\nhttp://b\n";
    let playlist = parse_m3u(content).unwrap();

    assert_eq!(playlist.channels.len(), 2);
    assert!(playlist.channels.iter().all(|c| c.group_title == "News"));
    assert_eq!(
        playlist.groups,
        vec![Group { id: "group_0".to_string(), name: "News".to_string(), channel_count: 2 }]
    );
}

#[test]
fn test_missing_header_is_format_error() {
    let err = parse_m3u("#EXTINF:-1,Channel A\nhttp://a\n").unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("#EXTM3U"));

    assert!(parse_m3u("").unwrap_err().is_format());
    assert!(parse_m3u("\n\n   \n").unwrap_err().is_format());
}

#[test]
fn test_header_after_blank_lines() {
    let content = "\n\n  #EXTM3U\n#EXTINF:-1,One\nhttp://one\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels.len(), 1);
}

#[test]
fn test_header_after_byte_order_mark() {
    let content = "\u{feff}#EXTM3U\n#EXTINF:-1,A\nhttp://a\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels.len(), 1);
    assert_eq!(playlist.channels[0].name, "A");

    let path = std::env::temp_dir().join(format!("iptv_ingest_bom_{}.m3u", std::process::id()));
    std::fs::write(&path, content.as_bytes()).unwrap();
    let from_file = parse_file(path.to_str().unwrap()).unwrap();
    assert_eq!(from_file, playlist);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_header_only() {
    let playlist = parse_m3u("#EXTM3U\n").unwrap();
    assert!(playlist.channels.is_empty());
    assert!(playlist.groups.is_empty());
}

#[test]
fn test_parse_m3u_with_epg_url() {
    let content = r#"#EXTM3U x-tvg-url="http://example.com/epg.xml"
#EXTINF:-1 tvg-id="ch1" tvg-name="Channel One" group-title="General",Channel 1
http://example.com/live/user/pass/1.ts
"#;
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.epg_url, Some("http://example.com/epg.xml".to_string()));
    assert_eq!(playlist.channels.len(), 1);
    assert_eq!(playlist.channels[0].tvg_name, Some("Channel One".to_string()));

    let alt = parse_m3u("#EXTM3U url-tvg=\"http://example.com/alt.xml\"\n").unwrap();
    assert_eq!(alt.epg_url, Some("http://example.com/alt.xml".to_string()));
}

#[test]
fn test_attributes_case_insensitive() {
    let content = r#"#EXTM3U
#EXTINF:-1 TVG-ID="Channel1" Tvg-Logo="http://example.com/1.png" GROUP-TITLE="Entertainment",Channel 1
http://example.com/stream1.ts
"#;
    let playlist = parse_m3u(content).unwrap();
    let channel = &playlist.channels[0];
    assert_eq!(channel.tvg_id.as_deref(), Some("Channel1"));
    assert_eq!(channel.tvg_logo.as_deref(), Some("http://example.com/1.png"));
    assert_eq!(channel.group_title, "Entertainment");
}

#[test]
fn test_parse_attrs_unquoted() {
    let content = r#"#EXTM3U
#EXTINF:-1 tvg-id=unquoted group-title="Quoted Group",Test Channel
http://example.com/stream.ts
"#;
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].tvg_id, Some("unquoted".to_string()));
    assert_eq!(playlist.channels[0].group_title, "Quoted Group");
}

#[test]
fn test_parse_malformed_stray_quotes() {
    let content = r#"#EXTM3U
#EXTINF:0 tvg-logo="https://example.com/logo.png" "tvg-name="SRF1.ch" group-title="Deutsch", SRF 1 FHD
udp://@233.50.230.1:5000
"#;
    let playlist = parse_m3u(content).unwrap();
    let channel = &playlist.channels[0];
    assert_eq!(channel.name, "SRF 1 FHD");
    assert_eq!(channel.tvg_logo.as_deref(), Some("https://example.com/logo.png"));
    assert_eq!(channel.tvg_name.as_deref(), Some("SRF1.ch"));
    assert_eq!(channel.group_title, "Deutsch");
    assert_eq!(channel.duration, 0.0);
    assert_eq!(channel.url, "udp://@233.50.230.1:5000");
}

#[test]
fn test_name_after_last_comma() {
    let content = "#EXTM3U\n#EXTINF:-1 group-title=\"News, Weather\",Local, Channel\nhttp://x\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].name, "Channel");
    assert_eq!(playlist.channels[0].group_title, "News, Weather");
}

#[test]
fn test_name_falls_back_to_tvg_name() {
    let content = "#EXTM3U\n#EXTINF:-1 tvg-name=\"Fallback Name\"\nhttp://x\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].name, "Fallback Name");
}

#[test]
fn test_name_falls_back_to_trailing_text() {
    let content = "#EXTM3U\n#EXTINF:-1 Bare Name\nhttp://x\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].name, "-1 Bare Name");
}

#[test]
fn test_duration() {
    let content = "#EXTM3U\n#EXTINF:10.5,Clip\nhttp://clip\n#EXTINF:-1,Live\nhttp://live\n#EXTINF:,None\nhttp://none\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].duration, 10.5);
    assert_eq!(playlist.channels[1].duration, -1.0);
    assert_eq!(playlist.channels[2].duration, -1.0);
}

#[test]
fn test_synthesized_tvg_id_from_name() {
    let content = "#EXTM3U\n#EXTINF:-1 tvg-id=\"\",BBC  One HD\nhttp://bbc\n";
    let playlist = parse_m3u(content).unwrap();
    let channel = &playlist.channels[0];
    assert_eq!(channel.tvg_id.as_deref(), Some("bbc_one_hd"));
    assert_eq!(channel.id, "bbc_one_hd");
    assert_eq!(channel.group_title, UNCATEGORIZED);
}

#[test]
fn test_empty_name_uses_stable_hash() {
    let content = "#EXTM3U\n#EXTINF:-1 group-title=\"Misc\",\nhttp://nameless\n";
    let first = parse_m3u(content).unwrap();
    let second = parse_m3u(content).unwrap();

    let channel = &first.channels[0];
    assert_eq!(channel.tvg_id, None);
    assert!(channel.id.starts_with(ID_PREFIX));
    assert_eq!(channel.id, second.channels[0].id);
}

#[test]
fn test_ids_stable_across_parses() {
    let content = r#"#EXTM3U
#EXTINF:-1 group-title="Sports",Sky Sports 1
http://example.com/1
#EXTINF:-1 tvg-id="espn.us",ESPN
http://example.com/2
#EXTINF:-1,
http://example.com/3
"#;
    let a: Vec<String> = parse_m3u(content).unwrap().channels.into_iter().map(|c| c.id).collect();
    let b: Vec<String> = parse_m3u(content).unwrap().channels.into_iter().map(|c| c.id).collect();
    assert_eq!(a, b);
    assert_eq!(a[1], "espn.us");
}

#[test]
fn test_group_carried_across_entries() {
    let content = r#"#EXTM3U
#EXTINF:-1 group-title="Movies",Film 1
http://f1
#EXTINF:-1,Film 2
http://f2
#EXTINF:-1 group-title="Kids",Cartoons
http://k1
#EXTINF:-1,More Cartoons
http://k2
"#;
    let playlist = parse_m3u(content).unwrap();
    let groups: Vec<&str> = playlist.channels.iter().map(|c| c.group_title.as_str()).collect();
    assert_eq!(groups, vec!["Movies", "Movies", "Kids", "Kids"]);
    assert_eq!(playlist.groups.len(), 2);
    assert_eq!(playlist.groups[1].id, "group_1");
    assert_eq!(playlist.groups[1].channel_count, 2);
}

#[test]
fn test_extgrp_override() {
    let content = r#"#EXTM3U
#EXTGRP:Radio
#EXTINF:-1,Station 1
http://s1
#EXTINF:-1 group-title="TV",Channel 1
#EXTGRP:Overridden
http://c1
#EXTINF:-1,Channel 2
http://c2
"#;
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].group_title, "Radio");
    assert_eq!(playlist.channels[1].group_title, "Overridden");
    assert_eq!(playlist.channels[2].group_title, "Overridden");
}

#[test]
fn test_url_without_extinf_is_dropped() {
    let content = r#"#EXTM3U
http://orphan.example.com/stream
#EXTINF:-1,Real
http://real
http://second-orphan
"#;
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels.len(), 1);
    assert_eq!(playlist.channels[0].url, "http://real");
}

#[test]
fn test_directives_and_blanks_between_entry_and_url() {
    let content = r#"#EXTM3U
#EXTINF:-1 group-title="News",Channel A

#EXTVLCOPT:http-user-agent=Test
#EXTGRP:Other

http://a
"#;
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels.len(), 1);
    assert_eq!(playlist.channels[0].group_title, "Other");
}

#[test]
fn test_second_extinf_replaces_pending() {
    let content = "#EXTM3U\n#EXTINF:-1,Lost\n#EXTINF:-1,Kept\nhttp://kept\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels.len(), 1);
    assert_eq!(playlist.channels[0].name, "Kept");
}

#[test]
fn test_crlf_line_endings() {
    let content = "#EXTM3U\r\n#EXTINF:-1 group-title=\"A\",One\r\nhttp://one\r\n";
    let playlist = parse_m3u(content).unwrap();
    assert_eq!(playlist.channels[0].name, "One");
    assert_eq!(playlist.channels[0].url, "http://one");
}

#[test]
fn test_group_counts_sum_to_channel_count() {
    let content = r#"#EXTM3U
#EXTINF:-1 group-title="A",1
http://1
#EXTINF:-1 group-title="B",2
http://2
#EXTINF:-1,3
http://3
#EXTINF:-1 group-title="A",4
http://4
#EXTINF:-1 group-title="a",5
http://5
"#;
    let playlist = parse_m3u(content).unwrap();
    let total: usize = playlist.groups.iter().map(|g| g.channel_count).sum();
    assert_eq!(total, playlist.channels.len());

    // Entry 3 inherits the carried group "B"
    let names: Vec<&str> = playlist.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "a"]);
    assert_eq!(playlist.groups[0].channel_count, 2);
    assert_eq!(playlist.groups[1].channel_count, 2);
    assert_eq!(playlist.groups[2].channel_count, 1);
}

#[test]
fn test_channels_in_group() {
    let content = "#EXTM3U\n#EXTINF:-1 group-title=\"X\",One\nhttp://1\n#EXTINF:-1 group-title=\"Y\",Two\nhttp://2\n";
    let playlist = parse_m3u(content).unwrap();
    let names: Vec<&str> = playlist.channels_in_group("Y").map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Two"]);
    assert!(playlist.channel("one").is_some());
}

#[test]
fn test_scanner_transitions() {
    let mut scanner = Scanner::default();
    assert_eq!(scanner.step(Line::Url("http://x")), None);
    assert_eq!(scanner.orphan_urls, 1);

    assert_eq!(scanner.step(Line::GroupOverride("G")), None);
    assert_eq!(scanner.state, ScanState::AwaitingEntry);

    assert_eq!(scanner.step(Line::Info("-1,Name")), None);
    assert!(matches!(scanner.state, ScanState::EntryPending(_)));

    assert_eq!(scanner.step(Line::Directive), None);
    assert!(matches!(scanner.state, ScanState::EntryPending(_)));

    let channel = scanner.step(Line::Url("http://y")).unwrap();
    assert_eq!(channel.group_title, "G");
    assert_eq!(scanner.state, ScanState::AwaitingEntry);
}

#[test]
fn test_extract_attr_boundaries() {
    assert_eq!(extract_attr(r#"-1 xtvg-id="no" tvg-id="yes""#, "tvg-id"), Some("yes".to_string()));
    assert_eq!(extract_attr(r#"-1 tvg-id"#, "tvg-id"), None);
    assert_eq!(extract_attr(r#"-1 tvg-logo="unterminated"#, "tvg-logo"), Some("unterminated".to_string()));
}
