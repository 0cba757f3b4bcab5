//! Post extraction from scraped X/Nitter search pages.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::{Captures, Regex};

static TWEET_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[^>]*data-testid="tweetText"[^>]*>(.*?)</div>"#)
        .expect("valid tweetText regex")
});

static TWEET_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[^>]*class="tweet-content[^"]*"[^>]*>(.*?)</div>"#)
        .expect("valid tweet-content regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#?[0-9A-Za-z]+;").expect("valid entity regex"));

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"));

/// Pull post bodies out of a search page.
///
/// X markup (`data-testid="tweetText"`) is tried first, Nitter markup
/// (`class="tweet-content"`) second.
pub(super) fn extract_posts(payload: &str) -> Vec<String> {
    let mut blocks: Vec<&str> = TWEET_TEXT_RE
        .captures_iter(payload)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if blocks.is_empty() {
        blocks = TWEET_CONTENT_RE
            .captures_iter(payload)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
    }

    blocks
        .into_iter()
        .map(clean_block)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Strip tags, decode entities, and collapse whitespace.
pub(super) fn clean_block(block: &str) -> String {
    let stripped = TAG_RE.replace_all(block, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML named and numeric character references one at a time.
/// References the HTML5 table does not know are left as written.
fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &Captures<'_>| {
        let raw = &caps[0];
        unescape_with(raw, resolve_html5_entity)
            .map_or_else(|_| raw.to_string(), Cow::into_owned)
    })
}

/// First `max` distinct hashtags (without `#`) across posts, in order of appearance.
pub(super) fn unique_hashtags(posts: &[String], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for post in posts {
        for cap in HASHTAG_RE.captures_iter(post) {
            let Some(tag) = cap.get(1) else { continue };
            if seen.insert(tag.as_str().to_string()) {
                tags.push(tag.as_str().to_string());
                if tags.len() >= max {
                    return tags;
                }
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_x_markup_first() {
        let html = r#"
            <div data-testid="tweetText" dir="auto"><span>Great day</span> in <b>Paris</b> #sun</div>
            <div class="tweet-content media-body">ignored nitter body</div>
            <div data-testid="tweetText">Second &amp; last</div>
        "#;
        let posts = extract_posts(html);
        assert_eq!(posts, vec!["Great day in Paris #sun", "Second & last"]);
    }

    #[test]
    fn falls_back_to_nitter_markup() {
        let html = r#"<div class="tweet-content media-body" dir="auto">Rain
            again   today</div>"#;
        assert_eq!(extract_posts(html), vec!["Rain again today"]);
    }

    #[test]
    fn empty_blocks_are_dropped() {
        let html = r#"<div data-testid="tweetText"> <span></span> </div>"#;
        assert!(extract_posts(html).is_empty());
    }

    #[test]
    fn html_entities_decode_together() {
        assert_eq!(
            clean_block("Tom &amp; Jerry&nbsp;won&#39;t <b>panic</b>"),
            "Tom & Jerry won't panic"
        );
    }

    #[test]
    fn unknown_entities_and_bare_ampersands_are_kept() {
        assert_eq!(
            clean_block("R&D &notanentity; rock &amp; roll; &#x1F600;"),
            "R&D &notanentity; rock & roll; \u{1F600}"
        );
    }

    #[test]
    fn hashtags_are_unique_and_capped() {
        let posts = vec![
            "#one and #two".to_string(),
            "#two again, #three #four".to_string(),
            "#five #six".to_string(),
        ];
        assert_eq!(
            unique_hashtags(&posts, 5),
            vec!["one", "two", "three", "four", "five"]
        );
    }
}
